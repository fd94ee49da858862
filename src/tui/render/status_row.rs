use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::text::truncate_to_width;

const NAVIGATE_HINT: &str = "a add  space done  d delete  e export  ? help  q quit";
const FORM_HINT: &str = "Tab next field  Enter add  Esc cancel";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let line = match app.mode {
        Mode::ConfirmDelete => {
            let text = app
                .pending_delete
                .and_then(|id| app.board.store().get(id))
                .map(|t| t.text.as_str())
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    format!(" Delete \"{}\"? ", truncate_to_width(text, width / 2)),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("y/n", Style::default().fg(app.theme.highlight).bg(bg)),
            ])
        }
        Mode::Navigate | Mode::Add => {
            let hint = if app.mode == Mode::Add {
                FORM_HINT
            } else {
                NAVIGATE_HINT
            };
            let mut spans = Vec::new();
            if let Some(status) = &app.status {
                let color = if status.is_error {
                    app.theme.expired
                } else {
                    app.theme.text
                };
                spans.push(Span::styled(
                    format!(" {}", truncate_to_width(&status.text, width.saturating_sub(1))),
                    Style::default().fg(color).bg(bg),
                ));
            }
            // Right-align the key hint when there's room
            let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
            let hint_width = hint.chars().count() + 1;
            if content_width + hint_width < width {
                let padding = width - content_width - hint_width;
                spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
                spans.push(Span::styled(
                    hint,
                    Style::default().fg(app.theme.dim).bg(bg),
                ));
            }
            Line::from(spans)
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}
