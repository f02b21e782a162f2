mod input;
mod picker;
mod prompt;

use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use super::App;
use crate::backend::PromptRequest;
use crate::utils::highlight::HighlightedAnswer;

/// How long a status message stays before the key help returns.
pub const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum AppAction {
    Quit,
    ToggleFocus,
    EditInput {
        key: KeyEvent,
    },
    PasteInput {
        text: String,
    },
    SubmitInput,
    ScrollUp {
        lines: u16,
    },
    ScrollDown {
        lines: u16,
    },
    ScrollPageUp,
    ScrollPageDown,
    ScrollToTop,
    ScrollToBottom,
    OpenRolePicker,
    OpenSkillPicker,
    PickerMoveUp,
    PickerMoveDown,
    PickerTypeChar {
        ch: char,
    },
    PickerBackspace,
    PickerConfirm,
    PickerEscape,
    PromptCompleted {
        answer: HighlightedAnswer,
    },
    PromptRejected {
        message: String,
    },
    PromptFailed {
        error: String,
        timed_out: bool,
    },
    SaveTranscript,
    CopyTranscript,
    EditorFinished {
        error: Option<String>,
    },
    TranscriptSaved {
        path: PathBuf,
        announce: bool,
    },
    TranscriptSaveFailed {
        error: String,
    },
    SetStatus {
        message: String,
    },
    ClearStatus {
        generation: u64,
    },
}

impl AppAction {
    /// Actions originating from the keyboard, as opposed to results of
    /// background work.
    fn is_user_input(&self) -> bool {
        matches!(
            self,
            AppAction::ToggleFocus
                | AppAction::EditInput { .. }
                | AppAction::PasteInput { .. }
                | AppAction::SubmitInput
                | AppAction::OpenRolePicker
                | AppAction::OpenSkillPicker
                | AppAction::PickerMoveUp
                | AppAction::PickerMoveDown
                | AppAction::PickerTypeChar { .. }
                | AppAction::PickerBackspace
                | AppAction::PickerConfirm
                | AppAction::PickerEscape
                | AppAction::SaveTranscript
                | AppAction::CopyTranscript
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

#[derive(Debug)]
pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(AppActionEnvelope {
                action,
                context: ctx,
            });
        }
    }
}

/// Work the loop must run outside the state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SpawnPrompt(PromptRequest),
    PersistTranscript { transcript: String, announce: bool },
    OpenEditor { transcript: String },
    ScheduleStatusClear { generation: u64, after: Duration },
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        commands.extend(apply_action(app, envelope.action, envelope.context));
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Vec<AppCommand> {
    if app.ui.is_loading() && action.is_user_input() {
        return Vec::new();
    }

    match action {
        AppAction::Quit
        | AppAction::ToggleFocus
        | AppAction::EditInput { .. }
        | AppAction::PasteInput { .. }
        | AppAction::ScrollUp { .. }
        | AppAction::ScrollDown { .. }
        | AppAction::ScrollPageUp
        | AppAction::ScrollPageDown
        | AppAction::ScrollToTop
        | AppAction::ScrollToBottom
        | AppAction::SaveTranscript
        | AppAction::CopyTranscript
        | AppAction::EditorFinished { .. }
        | AppAction::TranscriptSaved { .. }
        | AppAction::TranscriptSaveFailed { .. }
        | AppAction::SetStatus { .. }
        | AppAction::ClearStatus { .. } => input::handle_input_action(app, action, ctx),

        AppAction::OpenRolePicker
        | AppAction::OpenSkillPicker
        | AppAction::PickerMoveUp
        | AppAction::PickerMoveDown
        | AppAction::PickerTypeChar { .. }
        | AppAction::PickerBackspace
        | AppAction::PickerConfirm
        | AppAction::PickerEscape => picker::handle_picker_action(app, action),

        AppAction::SubmitInput
        | AppAction::PromptCompleted { .. }
        | AppAction::PromptRejected { .. }
        | AppAction::PromptFailed { .. } => prompt::handle_prompt_action(app, action),
    }
}

/// Set a status and schedule its expiry.
pub(crate) fn set_status_message(app: &mut App, message: impl Into<String>) -> AppCommand {
    let generation = app.ui.set_status(message);
    AppCommand::ScheduleStatusClear {
        generation,
        after: STATUS_CLEAR_DELAY,
    }
}
