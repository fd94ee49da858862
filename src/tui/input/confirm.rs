use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::App;

/// y deletes, anything else cancels
pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        _ => app.cancel_delete(),
    }
}
