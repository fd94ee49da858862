use chrono::{TimeDelta, Utc};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::model::Config;
use crate::ops::board::TaskBoard;
use crate::tui::app::App;

pub const TERM_W: u16 = 100;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Render the whole app at the default test size.
pub fn render_app(app: &mut App) -> String {
    render_to_string(TERM_W, TERM_H, |frame, _| super::render(frame, app))
}

/// An app over a temp data dir holding tasks named `names`, each starting
/// in an hour and due an hour after that.
pub fn app_with_tasks(names: &[&str]) -> (TempDir, App) {
    let dir = TempDir::new().unwrap();
    let config = Config::default();
    let now = Utc::now();
    let mut board = TaskBoard::open(dir.path(), &config, now);
    for name in names {
        board
            .add_task(name, now + TimeDelta::hours(1), now + TimeDelta::hours(2), now)
            .unwrap();
    }
    let app = App::new(board, dir.path().to_path_buf(), config);
    (dir, app)
}
