use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::countdown::PhaseKind;
use crate::tui::app::App;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    pub pending: usize,
    pub active: usize,
    pub expired: usize,
    pub completed: usize,
}

pub fn phase_counts(app: &App) -> PhaseCounts {
    let mut counts = PhaseCounts::default();
    for task in app.board.tasks() {
        if task.completed {
            counts.completed += 1;
            continue;
        }
        match app.board.phase(task.id).map(|p| p.kind()) {
            Some(PhaseKind::Pending) => counts.pending += 1,
            Some(PhaseKind::Active) => counts.active += 1,
            Some(PhaseKind::Expired) => counts.expired += 1,
            None => {}
        }
    }
    counts
}

/// Title line plus a separator
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let counts = phase_counts(app);
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    let title = Line::from(vec![
        Span::styled(
            " tminus ",
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} tasks  ", app.board.tasks().len()), dim),
        Span::styled(
            format!("{} pending", counts.pending),
            Style::default().fg(app.theme.pending).bg(bg),
        ),
        Span::styled("  ", dim),
        Span::styled(
            format!("{} active", counts.active),
            Style::default().fg(app.theme.active).bg(bg),
        ),
        Span::styled("  ", dim),
        Span::styled(
            format!("{} expired", counts.expired),
            Style::default().fg(app.theme.expired).bg(bg),
        ),
        Span::styled("  ", dim),
        Span::styled(
            format!("{} completed", counts.completed),
            Style::default().fg(app.theme.completed).bg(bg),
        ),
    ]);
    let separator = Line::from(Span::styled(
        "\u{2500}".repeat(area.width as usize),
        dim,
    ));
    frame.render_widget(Paragraph::new(vec![title, separator]), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn counts_by_phase() {
        let (_dir, mut app) = app_with_tasks(&["a", "b"]);
        let id = app.board.tasks()[0].id;
        app.board.mark_completed(id).unwrap();
        assert_eq!(
            phase_counts(&app),
            PhaseCounts {
                pending: 1,
                completed: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn header_text() {
        let (_dir, app) = app_with_tasks(&["a"]);
        let out = render_to_string(TERM_W, 2, |frame, area| render_header(frame, &app, area));
        let first = out.lines().next().unwrap();
        assert!(first.contains("tminus"));
        assert!(first.contains("1 tasks"));
        assert!(first.contains("1 pending"));
        assert!(first.contains("0 expired"));
    }
}
