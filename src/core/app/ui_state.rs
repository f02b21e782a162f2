use std::time::Instant;
use tui_textarea::{CursorMove, TextArea};

pub const DEFAULT_STATUS: &str = "'ctrl+q':quit, 'ctrl+s':send, 'ctrl+r':pick role, 'ctrl+e':pick skill, 'ctrl+d':save conversation, 'ctrl+c':copy conversation, 'shift+tab':switch focus";

/// Exactly one mode is active at a time; it decides which keys are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    TextInput,
    RoleSelect,
    SkillSelect,
    /// A prompt is in flight.
    Loading,
}

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiFocus {
    Input,
    Transcript,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub mode: UiMode,
    pub focus: UiFocus,
    textarea: TextArea<'static>,
    status: Option<String>,
    status_generation: u64,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub loading_since: Option<Instant>,
    /// Picker error shown inside the overlay until the next picker key.
    pub picker_error: Option<String>,
    pub exit_requested: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            mode: UiMode::TextInput,
            focus: UiFocus::Input,
            textarea: TextArea::default(),
            status: None,
            status_generation: 0,
            scroll_offset: 0,
            auto_scroll: true,
            loading_since: None,
            picker_error: None,
            exit_requested: false,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            UiFocus::Transcript => UiFocus::Input,
            UiFocus::Input => UiFocus::Transcript,
        };
    }

    pub fn is_loading(&self) -> bool {
        self.mode == UiMode::Loading
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn textarea_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.textarea
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Replace the input, leaving the cursor at the end.
    pub fn set_input_text(&mut self, text: &str) {
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.textarea = TextArea::from(lines);
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear_input(&mut self) {
        self.textarea = TextArea::default();
    }

    /// The status line text: the last message, or the key help.
    pub fn status_text(&self) -> &str {
        self.status.as_deref().unwrap_or(DEFAULT_STATUS)
    }

    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }

    /// Set a status message and return the generation a later clear must
    /// match.
    pub fn set_status(&mut self, message: impl Into<String>) -> u64 {
        self.status = Some(message.into());
        self.status_generation += 1;
        self.status_generation
    }

    /// Clear the status unless a newer one was set after `generation`.
    pub fn clear_status(&mut self, generation: u64) -> bool {
        if generation != self.status_generation {
            return false;
        }
        self.status = None;
        true
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Scrolling is clamped by the renderer; reaching the end re-enables
    /// follow mode there.
    pub fn scroll_down(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
    }

    /// Fit the offset to the rendered transcript and return it. Following
    /// resumes once the user scrolls back to the end.
    pub fn clamp_scroll(&mut self, max_offset: u16) -> u16 {
        if self.auto_scroll || self.scroll_offset >= max_offset {
            self.scroll_offset = max_offset;
            self.auto_scroll = true;
        }
        self.scroll_offset
    }
}
