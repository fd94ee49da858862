use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ops::board::Field;
use crate::tui::app::App;

const FIELDS: [(Field, &str); 3] = [
    (Field::Text, "Task"),
    (Field::Start, "Start"),
    (Field::Deadline, "Deadline"),
];

/// Bordered new-task form pinned to the bottom of `area`
pub fn render_add_form(frame: &mut Frame, app: &App, area: Rect) {
    let height = area.height.min(5);
    let form_area = Rect {
        x: area.x,
        y: area.y + area.height - height,
        width: area.width,
        height,
    };
    frame.render_widget(Clear, form_area);

    let bg = app.theme.background;
    let label_style = Style::default().fg(app.theme.dim).bg(bg);
    let focused_label = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let value_style = Style::default().fg(app.theme.text_bright).bg(bg);

    let lines: Vec<Line> = FIELDS
        .iter()
        .map(|(field, label)| {
            let focused = app.form.focus == *field;
            let value = match field {
                Field::Text => &app.form.text,
                Field::Start => &app.form.start,
                Field::Deadline => &app.form.deadline,
            };
            let mut spans = vec![
                Span::styled(
                    format!(" {:<10}", format!("{}:", label)),
                    if focused { focused_label } else { label_style },
                ),
                Span::styled(value.clone(), value_style),
            ];
            if focused {
                spans.push(Span::styled(
                    "\u{258C}",
                    Style::default().fg(app.theme.highlight).bg(bg),
                ));
            }
            Line::from(spans)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .title(" New task ");
    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}
