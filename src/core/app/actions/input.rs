use tui_textarea::Input as TAInput;

use super::{set_status_message, App, AppAction, AppActionContext, AppCommand};

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Vec<AppCommand> {
    match action {
        AppAction::Quit => {
            app.ui.exit_requested = true;
            Vec::new()
        }
        AppAction::ToggleFocus => {
            app.ui.toggle_focus();
            Vec::new()
        }
        AppAction::EditInput { key } => {
            app.ui.textarea_mut().input(TAInput::from(key));
            Vec::new()
        }
        AppAction::PasteInput { text } => {
            let text = text.replace("\r\n", "\n").replace('\r', "\n");
            app.ui.textarea_mut().insert_str(text);
            Vec::new()
        }
        AppAction::ScrollUp { lines } => {
            app.ui.scroll_up(lines);
            Vec::new()
        }
        AppAction::ScrollDown { lines } => {
            app.ui.scroll_down(lines);
            Vec::new()
        }
        AppAction::ScrollPageUp => {
            app.ui.scroll_up(page_lines(ctx));
            Vec::new()
        }
        AppAction::ScrollPageDown => {
            app.ui.scroll_down(page_lines(ctx));
            Vec::new()
        }
        AppAction::ScrollToTop => {
            app.ui.scroll_to_top();
            Vec::new()
        }
        AppAction::ScrollToBottom => {
            app.ui.scroll_to_bottom();
            Vec::new()
        }
        AppAction::SaveTranscript => {
            if app.session.is_empty() {
                return vec![set_status_message(app, "Nothing to save yet")];
            }
            vec![AppCommand::PersistTranscript {
                transcript: app.session.plain_transcript(),
                announce: true,
            }]
        }
        AppAction::CopyTranscript => {
            if app.session.is_empty() {
                return vec![set_status_message(app, "Nothing to copy yet")];
            }
            vec![AppCommand::OpenEditor {
                transcript: app.session.plain_transcript(),
            }]
        }
        AppAction::EditorFinished { error } => {
            let message = match error {
                Some(error) => format!("Error entering copy mode: {error}"),
                None => "Returned from editor".to_string(),
            };
            vec![set_status_message(app, message)]
        }
        AppAction::TranscriptSaved { path, announce } => {
            if announce {
                let message = format!("Conversation saved to {}", path.display());
                vec![set_status_message(app, message)]
            } else {
                Vec::new()
            }
        }
        AppAction::TranscriptSaveFailed { error } => {
            vec![set_status_message(
                app,
                format!("Error saving conversation: {error}"),
            )]
        }
        AppAction::SetStatus { message } => vec![set_status_message(app, message)],
        AppAction::ClearStatus { generation } => {
            app.ui.clear_status(generation);
            Vec::new()
        }
        _ => unreachable!("non-input action routed to input handler"),
    }
}

fn page_lines(ctx: AppActionContext) -> u16 {
    (ctx.term_height / 2).max(1)
}
