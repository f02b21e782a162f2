use tracing::{debug, warn};

use super::{set_status_message, App, AppAction, AppCommand};
use crate::core::app::UiMode;

const ANSWER_FETCHED: &str = "Answer fetched successfully";

pub(super) fn handle_prompt_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::SubmitInput => handle_submit(app),
        AppAction::PromptCompleted { answer } => {
            let Some(user_text) = app.finish_prompt() else {
                warn!("answer arrived with no prompt in flight");
                return Vec::new();
            };
            debug!(code_blocks = answer.code_block_count(), "answer received");
            app.session.record_exchange(&user_text, answer);
            app.ui.scroll_to_bottom();
            let clear = set_status_message(app, ANSWER_FETCHED);
            vec![
                AppCommand::PersistTranscript {
                    transcript: app.session.plain_transcript(),
                    announce: false,
                },
                clear,
            ]
        }
        AppAction::PromptRejected { message } => {
            restore_pending_input(app);
            vec![set_status_message(app, message)]
        }
        AppAction::PromptFailed { error, timed_out } => {
            restore_pending_input(app);
            let message = if timed_out {
                format!("Error fetching answer: no response in time ({error})")
            } else {
                format!("Error fetching answer: {error}")
            };
            vec![set_status_message(app, message)]
        }
        _ => unreachable!("non-prompt action routed to prompt handler"),
    }
}

fn handle_submit(app: &mut App) -> Vec<AppCommand> {
    if app.ui.mode != UiMode::TextInput {
        return Vec::new();
    }
    let text = app.ui.input_text();
    if text.trim().is_empty() {
        return vec![set_status_message(app, "Type a message before sending")];
    }
    vec![AppCommand::SpawnPrompt(app.begin_prompt(text))]
}

/// Put the submitted text back so the user can edit and retry.
fn restore_pending_input(app: &mut App) {
    if let Some(text) = app.finish_prompt() {
        app.ui.set_input_text(&text);
    }
}
