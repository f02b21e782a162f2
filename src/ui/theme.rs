use ratatui::style::{Color, Modifier, Style};
use tracing::warn;

pub const HIGHLIGHT_COLOR_ENV: &str = "GAIL_HIGHLIGHT_COLOR";
const DEFAULT_HIGHLIGHT: Color = Color::Indexed(6);

/// Styles for one session. Built once from the environment and passed by
/// reference to every render; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub highlight: Color,
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub title_style: Style,
    pub status_style: Style,
    pub spinner_style: Style,
    pub focused_border_style: Style,
    pub unfocused_border_style: Style,
    pub picker_selected_style: Style,
    pub picker_detail_style: Style,
    pub error_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::with_highlight(DEFAULT_HIGHLIGHT)
    }
}

impl Theme {
    pub fn with_highlight(highlight: Color) -> Self {
        Theme {
            highlight,
            user_prefix_style: Style::default()
                .fg(Color::Indexed(5))
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default(),
            assistant_prefix_style: Style::default()
                .fg(Color::Indexed(6))
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default(),
            title_style: Style::default().fg(highlight).add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(Color::Gray),
            spinner_style: Style::default().fg(Color::Indexed(205)),
            focused_border_style: Style::default().fg(highlight),
            unfocused_border_style: Style::default().fg(Color::DarkGray),
            picker_selected_style: Style::default()
                .fg(highlight)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            picker_detail_style: Style::default().fg(Color::Gray),
            error_style: Style::default().fg(Color::Red),
        }
    }

    /// Theme from `GAIL_HIGHLIGHT_COLOR`, falling back to the default on
    /// absent or unparseable values.
    pub fn from_env() -> Self {
        match std::env::var(HIGHLIGHT_COLOR_ENV) {
            Ok(value) => match parse_color(&value) {
                Some(color) => Self::with_highlight(color),
                None => {
                    warn!(value = %value, "ignoring unrecognised {}", HIGHLIGHT_COLOR_ENV);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            self.focused_border_style
        } else {
            self.unfocused_border_style
        }
    }
}

/// Accepts an ANSI 256 index (`6`, `205`) or `#rrggbb`.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        return Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?));
    }
    value.parse::<u8>().ok().map(Color::Indexed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_indexed_and_hex_colors() {
        assert_eq!(parse_color("6"), Some(Color::Indexed(6)));
        assert_eq!(parse_color(" 205 "), Some(Color::Indexed(205)));
        assert_eq!(parse_color("#1a2B3c"), Some(Color::Rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(parse_color("256"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("cyan"), None);
    }

    #[test]
    fn highlight_drives_focus_border_and_title() {
        let theme = Theme::with_highlight(Color::Indexed(2));
        assert_eq!(theme.border_style(true).fg, Some(Color::Indexed(2)));
        assert_eq!(theme.border_style(false).fg, Some(Color::DarkGray));
        assert_eq!(theme.title_style.fg, Some(Color::Indexed(2)));
        assert_eq!(Theme::default().highlight, Color::Indexed(6));
    }
}
