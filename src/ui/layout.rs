//! Frame geometry and width-aware line wrapping.
//!
//! Every value here is derived from the current terminal size on each draw;
//! nothing is cached between frames.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

const INPUT_MIN_HEIGHT: u16 = 3;
const INPUT_MAX_HEIGHT: u16 = 12;
const STATUS_HEIGHT: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub transcript: Rect,
    pub input: Rect,
    pub status: Rect,
}

impl FrameLayout {
    /// Transcript on top, input box taking a fifth of the height, one status
    /// line at the bottom.
    pub fn compute(area: Rect) -> Self {
        let input_height = (area.height / 5).clamp(INPUT_MIN_HEIGHT, INPUT_MAX_HEIGHT) + 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(input_height),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .split(area);
        Self {
            transcript: chunks[0],
            input: chunks[1],
            status: chunks[2],
        }
    }
}

/// Centered overlay covering `percent_x` by `percent_y` of `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Split a styled line into lines no wider than `width` columns.
///
/// Breaks fall on whitespace where possible; a word wider than the line is
/// broken by character. Whitespace at a break is dropped.
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 || line.width() <= width {
        return vec![line.clone()];
    }

    let mut wrapper = Wrapper::new(width);
    for span in &line.spans {
        for token in tokens(&span.content) {
            wrapper.push_token(token, span.style);
        }
    }
    wrapper.finish()
}

pub fn wrap_lines(lines: &[Line<'static>], width: usize) -> Vec<Line<'static>> {
    lines.iter().flat_map(|line| wrap_line(line, width)).collect()
}

/// Alternating runs of whitespace and non-whitespace.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != space)
            .map_or(rest.len(), |(i, _)| i);
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

struct Wrapper {
    width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    used: usize,
}

impl Wrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Vec::new(),
            used: 0,
        }
    }

    fn push_token(&mut self, token: &str, style: Style) {
        let token_width = token.width();
        if self.used + token_width <= self.width {
            self.append(token, style, token_width);
            return;
        }
        if token.chars().all(char::is_whitespace) {
            self.break_line();
            return;
        }
        if token_width <= self.width {
            self.break_line();
            self.append(token, style, token_width);
            return;
        }
        for ch in token.chars() {
            let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if self.used + ch_width > self.width {
                self.break_line();
            }
            let mut buf = [0u8; 4];
            self.append(ch.encode_utf8(&mut buf), style, ch_width);
        }
    }

    fn append(&mut self, text: &str, style: Style, width: usize) {
        if self.used == 0 && text.chars().all(char::is_whitespace) && !self.lines.is_empty() {
            return;
        }
        self.used += width;
        match self.current.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => self.current.push(Span::styled(text.to_string(), style)),
        }
    }

    fn break_line(&mut self) {
        if let Some(last) = self.current.last_mut() {
            let trimmed = last.content.trim_end().len();
            last.content.to_mut().truncate(trimmed);
            if last.content.is_empty() {
                self.current.pop();
            }
        }
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
        self.used = 0;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn texts(lines: &[Line<'static>]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn layout_splits_transcript_input_and_status() {
        let layout = FrameLayout::compute(Rect::new(0, 0, 80, 30));
        assert_eq!(layout.status.height, 1);
        assert_eq!(layout.input.height, 8);
        assert_eq!(layout.transcript.height, 21);
        assert_eq!(layout.status.y, 29);

        let tiny = FrameLayout::compute(Rect::new(0, 0, 40, 10));
        assert_eq!(tiny.input.height, 5);
    }

    #[test]
    fn short_lines_are_untouched() {
        let line = Line::from("fits");
        assert_eq!(wrap_line(&line, 10), vec![line]);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let line = Line::from("the quick brown fox jumps");
        assert_eq!(
            texts(&wrap_line(&line, 10)),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn long_words_break_by_character() {
        let line = Line::from("abcdefghijkl xy");
        assert_eq!(texts(&wrap_line(&line, 5)), vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn wide_characters_count_double() {
        let line = Line::from("日本語テキスト");
        let wrapped = wrap_line(&line, 6);
        assert_eq!(texts(&wrapped), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn styles_survive_wrapping() {
        let prefix = Style::default().fg(Color::Indexed(5));
        let line = Line::from(vec![
            Span::styled("You: ", prefix),
            Span::raw("hello there friend"),
        ]);
        let wrapped = wrap_line(&line, 11);
        assert_eq!(texts(&wrapped), vec!["You: hello", "there", "friend"]);
        assert_eq!(wrapped[0].spans[0].style, prefix);
        assert_eq!(wrapped[0].spans[1].content, "hello");
    }
}
