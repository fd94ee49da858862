use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};

use crate::model::Task;
use crate::ops::countdown::Phase;
use crate::tui::app::App;
use crate::tui::theme::Theme;
use crate::util::text::{display_width, truncate_to_width};
use crate::util::time::format_instant;

/// One list entry: title, times, countdown
fn task_item(
    position: usize,
    task: &Task,
    phase: Option<Phase>,
    theme: &Theme,
    time_format: &str,
    width: usize,
) -> ListItem<'static> {
    let bg = theme.background;
    let check = if task.completed { "[x]" } else { "[ ]" };
    let prefix = format!(" {:>2}. {} ", position, check);
    let title_width = width.saturating_sub(display_width(&prefix));
    let mut title_style = Style::default().fg(theme.text_bright).bg(bg);
    if task.completed {
        title_style = title_style
            .fg(theme.dim)
            .add_modifier(Modifier::CROSSED_OUT);
    }

    let title = Line::from(vec![
        Span::styled(prefix, Style::default().fg(theme.dim).bg(bg)),
        Span::styled(truncate_to_width(&task.text, title_width), title_style),
    ]);

    let times = Line::from(Span::styled(
        format!(
            "      Start: {}   Deadline: {}",
            format_instant(task.start, time_format),
            format_instant(task.deadline, time_format),
        ),
        Style::default().fg(theme.text).bg(bg),
    ));

    let (status, color) = if task.completed {
        ("Completed".to_string(), theme.completed)
    } else {
        match phase {
            Some(p) => (p.to_string(), theme.phase_color(p.kind())),
            None => (String::new(), theme.dim),
        }
    };
    let countdown = Line::from(Span::styled(
        format!("      {}", status),
        Style::default().fg(color).bg(bg),
    ));

    ListItem::new(vec![title, times, countdown])
}

pub fn render_task_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;

    if app.board.tasks().is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "  No tasks yet. Press a to add one.",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
        frame.render_widget(hint, area);
        return;
    }

    let width = area.width as usize;
    let items: Vec<ListItem> = app
        .board
        .tasks()
        .iter()
        .enumerate()
        .map(|(i, task)| {
            task_item(
                i + 1,
                task,
                app.board.phase(task.id),
                &app.theme,
                &app.config.ui.time_format,
                width,
            )
        })
        .collect();

    let list = List::new(items).highlight_style(Style::default().bg(app.theme.selection_bg));
    frame.render_stateful_widget(list, area, &mut app.list_state);
}
