use std::time::Instant;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::core::app::{App, UiFocus};
use crate::core::message::{ConversationTurn, Speaker};
use crate::ui::layout::{centered_rect, wrap_lines, FrameLayout};
use crate::ui::picker::PickerState;
use crate::ui::theme::Theme;
use crate::utils::highlight::Segment;

const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const SPINNER_FRAME_MS: u128 = 100;

pub fn ui(f: &mut Frame, app: &mut App, theme: &Theme) {
    let layout = FrameLayout::compute(f.area());
    draw_transcript(f, app, theme, layout.transcript);
    draw_input(f, app, theme, layout.input);
    draw_status(f, app, theme, layout.status);

    if let Some(picker) = &app.picker {
        draw_picker(f, &picker.state, app.ui.picker_error.as_deref(), theme);
    }
}

fn draw_transcript(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let focused = app.ui.focus == UiFocus::Transcript;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(focused))
        .title(Span::styled(format!(" {} ", app.header_text()), theme.title_style));
    let inner = block.inner(area);

    let lines = wrap_lines(&transcript_lines(app, theme), inner.width as usize);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_offset = total.saturating_sub(inner.height);
    let offset = app.ui.clamp_scroll(max_offset);

    let percent = if max_offset == 0 {
        100
    } else {
        u32::from(offset) * 100 / u32::from(max_offset)
    };
    let block = block.title_bottom(Line::from(format!(" {percent}% ")).right_aligned());

    f.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);
}

fn draw_input(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let focused = app.ui.focus == UiFocus::Input;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(focused))
        .title(" Message ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(app.ui.textarea(), inner);
}

fn draw_status(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let line = match app.ui.loading_since {
        Some(since) if app.ui.is_loading() => Line::from(vec![
            Span::styled(spinner_frame(since), theme.spinner_style),
            Span::styled(" thinking...", theme.status_style),
        ]),
        _ => Line::from(Span::styled(app.ui.status_text().to_string(), theme.status_style)),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_picker(f: &mut Frame, picker: &PickerState, error: Option<&str>, theme: &Theme) {
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);

    let title = if picker.filter().is_empty() {
        format!(" {} ", picker.title)
    } else {
        format!(" {} [{}] ", picker.title, picker.filter())
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.focused_border_style)
        .title(Span::styled(title, theme.title_style));
    let footer = match error {
        Some(error) => Line::from(Span::styled(format!(" {error} "), theme.error_style)),
        None => Line::from(" Enter: select, Esc: cancel, type to filter "),
    };
    block = block.title_bottom(footer);

    let items: Vec<ListItem> = picker
        .visible_items()
        .map(|item| {
            ListItem::new(vec![
                Line::from(item.label.clone()),
                Line::from(Span::styled(
                    format!("  {}", item.detail),
                    theme.picker_detail_style,
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.picker_selected_style);
    let mut state = ListState::default().with_selected(picker.selected_item().map(|_| picker.selected));
    f.render_stateful_widget(list, area, &mut state);
}

pub fn spinner_frame(since: Instant) -> &'static str {
    let index = (since.elapsed().as_millis() / SPINNER_FRAME_MS) as usize % SPINNER_FRAMES.len();
    SPINNER_FRAMES[index]
}

/// Unwrapped transcript lines: each turn with its speaker label, followed
/// by a blank line.
pub fn transcript_lines(app: &App, theme: &Theme) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::default();
    for turn in app.session.turns() {
        push_turn(&mut builder, turn, theme);
        builder.break_line();
        builder.break_line();
    }
    builder.finish()
}

fn push_turn(builder: &mut LineBuilder, turn: &ConversationTurn, theme: &Theme) {
    let (prefix_style, text_style) = match turn.speaker {
        Speaker::User => (theme.user_prefix_style, theme.user_text_style),
        Speaker::Assistant => (theme.assistant_prefix_style, theme.assistant_text_style),
    };
    builder.push_text(&format!("{}: ", turn.speaker.label()), prefix_style);

    let Some(answer) = &turn.rendered else {
        builder.push_text(&turn.text, text_style);
        return;
    };
    let fence_style = Style::default().add_modifier(Modifier::DIM);
    for segment in answer.segments() {
        match segment {
            Segment::Plain(text) => builder.push_text(text, text_style),
            Segment::Code {
                opening,
                closing,
                lines,
                ..
            } => {
                builder.push_text(opening, fence_style);
                for line in lines {
                    builder.push_spans(line.spans.iter().cloned());
                    builder.break_line();
                }
                builder.push_text(closing, fence_style);
            }
        }
    }
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str, style: Style) {
        for (index, piece) in text.split('\n').enumerate() {
            if index > 0 {
                self.break_line();
            }
            if !piece.is_empty() {
                self.current.push(Span::styled(piece.to_string(), style));
            }
        }
    }

    fn push_spans(&mut self, spans: impl IntoIterator<Item = Span<'static>>) {
        self.current.extend(spans);
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() {
            self.break_line();
        }
        self.lines
    }
}
