use ratatui::style::Color;

use crate::model::UiConfig;
use crate::ops::countdown::PhaseKind;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub pending: Color,
    pub active: Color,
    pub expired: Color,
    pub completed: Color,
    pub selection_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Reset,
            text: Color::Rgb(0xD0, 0xD0, 0xD0),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x80, 0x80, 0x80),
            pending: Color::Rgb(0x00, 0x7B, 0xFF),
            active: Color::Rgb(0xE5, 0x39, 0x35),
            expired: Color::Rgb(0xE5, 0x39, 0x35),
            completed: Color::Rgb(0x44, 0xBB, 0x66),
            selection_bg: Color::Rgb(0x2A, 0x2A, 0x3A),
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

impl Theme {
    /// Apply `[ui.colors]` overrides on top of the defaults
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();
        for (key, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                tracing::warn!(key = %key, value = %value, "ignoring invalid color");
                continue;
            };
            match key.as_str() {
                "background" => theme.background = color,
                "text" => theme.text = color,
                "text_bright" => theme.text_bright = color,
                "highlight" => theme.highlight = color,
                "dim" => theme.dim = color,
                "pending" => theme.pending = color,
                "active" => theme.active = color,
                "expired" => theme.expired = color,
                "completed" => theme.completed = color,
                "selection_bg" => theme.selection_bg = color,
                _ => {}
            }
        }
        theme
    }

    pub fn phase_color(&self, kind: PhaseKind) -> Color {
        match kind {
            PhaseKind::Pending => self.pending,
            PhaseKind::Active => self.active,
            PhaseKind::Expired => self.expired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            parse_hex_color("#007BFF"),
            Some(Color::Rgb(0x00, 0x7B, 0xFF))
        );
        assert_eq!(parse_hex_color("007BFF"), None);
        assert_eq!(parse_hex_color("#0B"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn test_from_config_overrides() {
        let mut ui = UiConfig::default();
        ui.colors.insert("pending".into(), "#112233".into());
        ui.colors.insert("expired".into(), "not-a-color".into());

        let theme = Theme::from_config(&ui);
        assert_eq!(theme.pending, Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.expired, Theme::default().expired);
    }

    #[test]
    fn test_phase_color() {
        let theme = Theme::default();
        assert_eq!(theme.phase_color(PhaseKind::Pending), theme.pending);
        assert_eq!(theme.phase_color(PhaseKind::Active), theme.active);
        assert_eq!(theme.phase_color(PhaseKind::Expired), theme.expired);
    }
}
