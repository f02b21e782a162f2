//! Fenced code extraction and syntax highlighting for assistant answers.
//!
//! An answer is split into alternating plain and code segments. Code segments
//! keep their original fence lines so the segments concatenate back to the
//! exact input; only the code body is highlighted.

use memchr::{memchr, memmem};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use std::error::Error as StdError;
use std::fmt;
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::warn;

pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";
pub const SYNTAX_THEME_ENV: &str = "GAIL_SYNTAX_THEME";
const FENCE: &[u8] = b"```";

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

#[derive(Debug)]
pub enum HighlightError {
    UnknownTheme(String),
    Syntax {
        language: String,
        source: syntect::Error,
    },
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightError::UnknownTheme(name) => write!(f, "Unknown syntax theme: {name}"),
            HighlightError::Syntax { language, source } => {
                write!(f, "Failed to highlight {language} code: {source}")
            }
        }
    }
}

impl StdError for HighlightError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            HighlightError::Syntax { source, .. } => Some(source),
            HighlightError::UnknownTheme(_) => None,
        }
    }
}

/// A syntect theme chosen once at startup.
#[derive(Debug, Clone)]
pub struct SyntaxTheme {
    name: String,
}

impl SyntaxTheme {
    /// Use `name` when syntect ships it, otherwise fall back to the default.
    pub fn resolve(name: &str) -> Self {
        if theme_set().themes.contains_key(name) {
            return Self {
                name: name.to_string(),
            };
        }
        warn!(theme = name, fallback = DEFAULT_SYNTAX_THEME, "unknown syntax theme");
        Self::default()
    }

    /// `GAIL_SYNTAX_THEME`, or the default when unset.
    pub fn from_env() -> Self {
        match std::env::var(SYNTAX_THEME_ENV) {
            Ok(name) if !name.trim().is_empty() => Self::resolve(name.trim()),
            _ => Self::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn theme(&self) -> Result<&'static Theme, HighlightError> {
        theme_set()
            .themes
            .get(&self.name)
            .ok_or_else(|| HighlightError::UnknownTheme(self.name.clone()))
    }
}

impl Default for SyntaxTheme {
    fn default() -> Self {
        Self {
            name: DEFAULT_SYNTAX_THEME.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Segment {
    Plain(String),
    Code {
        /// Display name of the syntax used.
        language: String,
        /// Opening fence line including its newline.
        opening: String,
        source: String,
        /// Closing fence line without its newline.
        closing: String,
        lines: Vec<Line<'static>>,
    },
}

#[derive(Debug, Clone)]
pub struct HighlightedAnswer {
    source: String,
    segments: Vec<Segment>,
}

impl HighlightedAnswer {
    /// Wrap text without looking for code fences.
    pub fn plain(text: &str) -> Self {
        Self {
            source: text.to_string(),
            segments: vec![Segment::Plain(text.to_string())],
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn code_block_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Code { .. }))
            .count()
    }

    /// Concatenate every segment back into text.
    pub fn reassemble(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Plain(text) => out.push_str(text),
                Segment::Code {
                    opening,
                    source,
                    closing,
                    ..
                } => {
                    out.push_str(opening);
                    out.push_str(source);
                    out.push_str(closing);
                }
            }
        }
        out
    }
}

/// A fence found at the start of a line.
struct FenceLine {
    start: usize,
    /// Byte offset just past the backticks.
    after_ticks: usize,
    /// End of the line, excluding the newline.
    end: usize,
}

fn find_fence(text: &str, from: usize) -> Option<FenceLine> {
    let bytes = text.as_bytes();
    for offset in memmem::find_iter(&bytes[from..], FENCE) {
        let ticks = from + offset;
        let line_start = text[..ticks].rfind('\n').map_or(0, |i| i + 1);
        if line_start < from || !text[line_start..ticks].trim().is_empty() {
            continue;
        }
        let end = memchr(b'\n', &bytes[ticks..]).map_or(bytes.len(), |i| ticks + i);
        return Some(FenceLine {
            start: line_start,
            after_ticks: ticks + FENCE.len(),
            end,
        });
    }
    None
}

fn find_closing_fence(text: &str, mut from: usize) -> Option<FenceLine> {
    while let Some(fence) = find_fence(text, from) {
        let rest = text[fence.after_ticks..fence.end].trim_start_matches('`');
        if rest.trim().is_empty() {
            return Some(fence);
        }
        from = (fence.end + 1).min(text.len());
        if from >= text.len() {
            break;
        }
    }
    None
}

fn normalize_lang_hint(hint: &str) -> String {
    let hint = hint.trim().to_ascii_lowercase();
    match hint.as_str() {
        "py" => "python".into(),
        "sh" | "zsh" | "shell" | "console" => "bash".into(),
        "js" | "jsx" => "javascript".into(),
        "ts" | "tsx" => "typescript".into(),
        "yml" => "yaml".into(),
        "rs" => "rust".into(),
        "golang" => "go".into(),
        "h" => "c".into(),
        "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "kt" => "kotlin".into(),
        _ => hint,
    }
}

fn pick_syntax<'a>(set: &'a SyntaxSet, hint: &str, code: &str) -> &'a SyntaxReference {
    let hinted = (!hint.is_empty())
        .then(|| set.find_syntax_by_token(&normalize_lang_hint(hint)))
        .flatten();
    hinted
        .or_else(|| set.find_syntax_by_first_line(code))
        .unwrap_or_else(|| set.find_syntax_plain_text())
}

fn highlight_code(
    code: &str,
    syntax: &SyntaxReference,
    theme: &Theme,
) -> Result<Vec<Line<'static>>, HighlightError> {
    let set = syntax_set();
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter
            .highlight_line(line, set)
            .map_err(|source| HighlightError::Syntax {
                language: syntax.name.clone(),
                source,
            })?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, fragment)| {
                let fragment = fragment.trim_end_matches(['\n', '\r']);
                let fg = style.foreground;
                Span::styled(fragment.to_string(), Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)))
            })
            .filter(|span| !span.content.is_empty())
            .collect();
        lines.push(Line::from(spans));
    }
    Ok(lines)
}

/// Split `text` into plain and highlighted code segments.
///
/// An opening fence without a matching close leaves the rest of the text
/// plain.
pub fn highlight_answer(
    text: &str,
    theme: &SyntaxTheme,
) -> Result<HighlightedAnswer, HighlightError> {
    let set = syntax_set();
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(open) = find_fence(text, cursor) {
        let body_start = (open.end + 1).min(text.len());
        let Some(close) = find_closing_fence(text, body_start) else {
            break;
        };

        if open.start > cursor {
            segments.push(Segment::Plain(text[cursor..open.start].to_string()));
        }

        let info = text[open.after_ticks..open.end].trim();
        let hint = info.split_whitespace().next().unwrap_or("");
        let source = &text[body_start..close.start];
        let syntax = pick_syntax(set, hint, source);
        let lines = highlight_code(source, syntax, theme.theme()?)?;

        segments.push(Segment::Code {
            language: syntax.name.clone(),
            opening: text[open.start..body_start].to_string(),
            source: source.to_string(),
            closing: text[close.start..close.end].to_string(),
            lines,
        });
        cursor = close.end;
    }

    if cursor < text.len() {
        segments.push(Segment::Plain(text[cursor..].to_string()));
    }

    Ok(HighlightedAnswer {
        source: text.to_string(),
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(text: &str) -> HighlightedAnswer {
        highlight_answer(text, &SyntaxTheme::default()).expect("highlight")
    }

    #[test]
    fn text_without_fences_is_unchanged() {
        let text = "Just prose.\nWith `inline` code and two lines.";
        let answer = highlight(text);
        assert_eq!(answer.segments().len(), 1);
        assert!(matches!(&answer.segments()[0], Segment::Plain(p) if p == text));
        assert_eq!(answer.reassemble(), text);
    }

    #[test]
    fn go_block_is_one_code_segment_between_two_plain_segments() {
        let text = "Before the code:\n```go\nfmt.Println(\"hi\")\n```\nAfter the code.";
        let answer = highlight(text);

        let segments = answer.segments();
        assert_eq!(segments.len(), 3);
        assert!(matches!(&segments[0], Segment::Plain(p) if p == "Before the code:\n"));
        match &segments[1] {
            Segment::Code {
                language,
                source,
                lines,
                ..
            } => {
                assert_eq!(language, "Go");
                assert_eq!(source, "fmt.Println(\"hi\")\n");
                assert_eq!(lines.len(), 1);
            }
            other => panic!("expected code, got {other:?}"),
        }
        assert!(matches!(&segments[2], Segment::Plain(p) if p == "\nAfter the code."));
        assert_eq!(answer.reassemble(), text);
        assert_eq!(answer.code_block_count(), 1);
    }

    #[test]
    fn missing_hint_uses_first_line_detection() {
        let answer = highlight("```\n#!/bin/bash\necho hi\n```");
        match &answer.segments()[0] {
            Segment::Code { language, .. } => assert!(language.to_lowercase().contains("bash")),
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn undetectable_code_falls_back_to_plain_text_syntax() {
        let answer = highlight("```\nsome words\n```");
        match &answer.segments()[0] {
            Segment::Code { language, .. } => assert_eq!(language, "Plain Text"),
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn unknown_hint_still_highlights() {
        let answer = highlight("```nosuchlang\nx = 1\n```\n");
        assert_eq!(answer.code_block_count(), 1);
        assert_eq!(answer.reassemble(), "```nosuchlang\nx = 1\n```\n");
    }

    #[test]
    fn unclosed_fence_stays_plain() {
        let text = "intro\n```rust\nfn main() {}\n";
        let answer = highlight(text);
        assert_eq!(answer.code_block_count(), 0);
        assert_eq!(answer.reassemble(), text);
    }

    #[test]
    fn multiple_blocks_keep_order() {
        let text = "a\n```rs\nlet x = 1;\n```\nb\n```py\nx = 1\n```\nc";
        let answer = highlight(text);
        let kinds: Vec<&str> = answer
            .segments()
            .iter()
            .map(|s| match s {
                Segment::Plain(_) => "plain",
                Segment::Code { .. } => "code",
            })
            .collect();
        assert_eq!(kinds, vec!["plain", "code", "plain", "code", "plain"]);
        assert_eq!(answer.reassemble(), text);
    }

    #[test]
    fn backticks_inside_a_line_are_not_fences() {
        let text = "use ``` to open a block";
        assert_eq!(highlight(text).code_block_count(), 0);
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        assert_eq!(SyntaxTheme::resolve("no-such-theme").name(), DEFAULT_SYNTAX_THEME);
        assert_eq!(SyntaxTheme::resolve("InspiredGitHub").name(), "InspiredGitHub");
    }
}
