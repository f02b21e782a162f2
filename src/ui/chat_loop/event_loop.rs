//! Event polling, action dispatch, command execution and redraws.
//!
//! The loop owns the [`App`] outright. Key presses are mapped and applied in
//! arrival order; slow work (prompts, history writes, status timers) runs on
//! Tokio tasks that report back through the action channel. The external
//! editor is the exception: it owns the terminal, so the loop suspends
//! itself until the editor exits.

use std::{
    error::Error,
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::{Duration, Instant},
};

use chrono::Local;
use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::backend::{ChatBackend, PromptOutcome, PromptRequest};
use crate::core::app::{
    apply_action, apply_actions, App, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand, UiFocus, UiMode,
};
use crate::ui::renderer::ui;
use crate::utils::editor::open_in_editor;
use crate::utils::highlight::{highlight_answer, SyntaxTheme};
use crate::utils::history::HistoryStore;

use super::keybindings::action_for_key;
use super::lifecycle::{
    restore_terminal, resume_terminal, setup_terminal, suspend_terminal, ChatTerminal,
};
use super::ChatServices;

const MAX_FPS: u64 = 60;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// The terminal input reader, stoppable while a child process owns stdin.
struct EventReader {
    tx: mpsc::UnboundedSender<UiEvent>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl EventReader {
    fn start(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        let handle = Some(spawn_event_reader(tx.clone()));
        Self { tx, handle }
    }

    async fn pause(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    fn resume(&mut self) {
        if self.handle.is_none() {
            self.handle = Some(spawn_event_reader(self.tx.clone()));
        }
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Run one prompt to completion and turn the result into the action that
/// reports it.
pub async fn run_prompt<B>(
    backend: &Mutex<B>,
    request: PromptRequest,
    syntax_theme: &SyntaxTheme,
) -> AppAction
where
    B: ChatBackend,
{
    let outcome = {
        let mut backend = backend.lock().await;
        backend.prompt(request).await
    };
    match outcome {
        Ok(PromptOutcome::Answered(text)) => match highlight_answer(&text, syntax_theme) {
            Ok(answer) => AppAction::PromptCompleted { answer },
            Err(err) => {
                error!(error = %err, "failed to highlight answer");
                AppAction::PromptFailed {
                    error: err.to_string(),
                    timed_out: false,
                }
            }
        },
        Ok(PromptOutcome::Rejected(message)) => {
            info!("prompt rejected by validator");
            AppAction::PromptRejected { message }
        }
        Err(err) => {
            error!(error = %err, "prompt failed");
            AppAction::PromptFailed {
                timed_out: err.is_timeout(),
                error: err.to_string(),
            }
        }
    }
}

/// Save the transcript and describe the outcome as an action.
pub fn persist_transcript(
    store: &StdMutex<HistoryStore>,
    transcript: &str,
    announce: bool,
) -> AppAction {
    let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
    match store.save(transcript, Local::now()) {
        Ok(path) => AppAction::TranscriptSaved { path, announce },
        Err(err) => {
            error!(error = %err, "failed to save conversation");
            AppAction::TranscriptSaveFailed {
                error: err.to_string(),
            }
        }
    }
}

fn spawn_prompt(services: &ChatServices, dispatcher: AppActionDispatcher, request: PromptRequest) {
    let backend = Arc::clone(&services.backend);
    let syntax_theme = Arc::clone(&services.syntax_theme);
    tokio::spawn(async move {
        let action = run_prompt(&backend, request, &syntax_theme).await;
        dispatcher.dispatch_many([action], AppActionContext::default());
    });
}

fn spawn_persist(
    services: &ChatServices,
    dispatcher: AppActionDispatcher,
    transcript: String,
    announce: bool,
) {
    let history = Arc::clone(&services.history);
    tokio::task::spawn_blocking(move || {
        let action = persist_transcript(&history, &transcript, announce);
        dispatcher.dispatch_many([action], AppActionContext::default());
    });
}

fn spawn_status_clear(dispatcher: AppActionDispatcher, generation: u64, after: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        dispatcher.dispatch_many(
            [AppAction::ClearStatus { generation }],
            AppActionContext::default(),
        );
    });
}

async fn run_editor(
    terminal: &mut ChatTerminal,
    reader: &mut EventReader,
    editor: &str,
    transcript: String,
) -> Result<AppAction, Box<dyn Error>> {
    reader.pause().await;
    suspend_terminal(terminal)?;

    let editor = editor.to_string();
    let result = tokio::task::spawn_blocking(move || open_in_editor(&editor, &transcript)).await;

    resume_terminal(terminal)?;
    reader.resume();

    let error = match result {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(join_err) => Some(join_err.to_string()),
    };
    Ok(AppAction::EditorFinished { error })
}

/// Map queued terminal events to actions and apply each immediately so the
/// next key sees the mode the previous one produced.
fn process_ui_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    ctx: AppActionContext,
    commands: &mut Vec<AppCommand>,
) -> bool {
    let mut processed = false;
    while let Ok(UiEvent::Crossterm(event)) = event_rx.try_recv() {
        processed = true;
        let action = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                action_for_key(app.ui.mode, app.ui.focus, key)
            }
            Event::Paste(text)
                if app.ui.mode == UiMode::TextInput && app.ui.focus == UiFocus::Input =>
            {
                Some(AppAction::PasteInput { text })
            }
            _ => None,
        };
        if let Some(action) = action {
            commands.extend(apply_action(app, action, ctx));
        }
    }
    processed
}

fn drain_action_queue(
    app: &mut App,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
    commands: &mut Vec<AppCommand>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }
    if pending.is_empty() {
        return false;
    }
    commands.extend(apply_actions(app, pending));
    true
}

pub async fn run_chat(mut app: App, services: ChatServices) -> Result<(), Box<dyn Error>> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let mut reader = EventReader::start(event_tx);

    let result = main_loop(
        &mut app,
        &services,
        &mut terminal,
        &mut reader,
        &dispatcher,
        &mut action_rx,
        &mut event_rx,
    )
    .await;

    reader.stop();
    restore_terminal(&mut terminal)?;
    result
}

async fn main_loop(
    app: &mut App,
    services: &ChatServices,
    terminal: &mut ChatTerminal,
    reader: &mut EventReader,
    dispatcher: &AppActionDispatcher,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn Error>> {
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    loop {
        if app.ui.exit_requested {
            info!("exit requested");
            return Ok(());
        }

        if request_redraw && last_draw.elapsed() >= frame_duration {
            terminal.draw(|f| ui(f, app, &services.theme))?;
            last_draw = Instant::now();
            request_redraw = false;
        }

        let size = terminal.size()?;
        let ctx = AppActionContext {
            term_width: size.width,
            term_height: size.height,
        };

        let mut commands = Vec::new();
        let events_processed = process_ui_events(app, event_rx, ctx, &mut commands);
        let actions_applied = drain_action_queue(app, action_rx, &mut commands);
        if events_processed || actions_applied {
            request_redraw = true;
        }

        for command in commands {
            match command {
                AppCommand::SpawnPrompt(request) => {
                    debug!(role = %request.role_name, "dispatching prompt");
                    spawn_prompt(services, dispatcher.clone(), request);
                }
                AppCommand::PersistTranscript {
                    transcript,
                    announce,
                } => spawn_persist(services, dispatcher.clone(), transcript, announce),
                AppCommand::ScheduleStatusClear { generation, after } => {
                    spawn_status_clear(dispatcher.clone(), generation, after)
                }
                AppCommand::OpenEditor { transcript } => {
                    let action = run_editor(terminal, reader, &services.editor, transcript).await?;
                    dispatcher.dispatch_many([action], ctx);
                    request_redraw = true;
                }
            }
        }

        if app.ui.is_loading() {
            request_redraw = true;
        }

        if !events_processed && !actions_applied && !app.ui.is_loading() {
            tokio::time::sleep(Duration::from_millis(16)).await;
        } else if !events_processed && !actions_applied {
            tokio::time::sleep(frame_duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::claude::ClaudeBackend;
    use crate::backend::test_support::{email_validator, ScriptedTransport};
    use crate::backend::{BackendSettings, JsonTransport};
    use crate::core::models::ModelKind;
    use crate::utils::test_utils::create_test_app;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use serde_json::json;
    use tempfile::TempDir;

    fn claude(transport: Arc<ScriptedTransport>) -> Mutex<ClaudeBackend> {
        let settings = BackendSettings::new(ModelKind::Claude, "key", "https://example.test/v1");
        let transport: Arc<dyn JsonTransport> = transport;
        Mutex::new(ClaudeBackend::new(settings, email_validator(), transport))
    }

    fn request(message: &str) -> PromptRequest {
        PromptRequest {
            role_name: "Software Engineer".into(),
            persona: "You are a software engineer".into(),
            instruction: "Be concise".into(),
            message: message.into(),
        }
    }

    #[tokio::test]
    async fn prompt_answer_is_highlighted() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "content": [{"type": "text", "text": "Use this:\n```rust\nfn main() {}\n```"}],
            "usage": {"input_tokens": 3, "output_tokens": 5}
        }))]);
        let backend = claude(transport);

        let action = run_prompt(&backend, request("fix this bug"), &SyntaxTheme::default()).await;

        match action {
            AppAction::PromptCompleted { answer } => assert_eq!(answer.code_block_count(), 1),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_prompt_never_reaches_the_transport() {
        let transport = ScriptedTransport::new(Vec::new());
        let backend = claude(transport.clone());

        let action = run_prompt(
            &backend,
            request("contact me at a@b.com"),
            &SyntaxTheme::default(),
        )
        .await;

        assert!(matches!(action, AppAction::PromptRejected { message } if message.contains("email")));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn backend_errors_become_failures() {
        let transport = ScriptedTransport::new(vec![Err(crate::backend::BackendError::Status {
            status: 500,
            body: "boom".into(),
        })]);
        let backend = claude(transport);

        let action = run_prompt(&backend, request("hello"), &SyntaxTheme::default()).await;

        assert!(matches!(
            action,
            AppAction::PromptFailed { timed_out: false, ref error } if error.contains("500")
        ));
    }

    #[tokio::test]
    async fn exchange_is_prefixed_recorded_and_saved_without_escape_codes() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "content": [{"type": "text", "text": "\u{1b}[1mTry X\u{1b}[0m\n```rust\nfn main() {}\n```"}],
            "usage": {"input_tokens": 12, "output_tokens": 9}
        }))]);
        let backend = claude(transport.clone());
        let mut app = create_test_app();
        app.ui.set_input_text("fix this bug");
        let ctx = AppActionContext::default();

        let request = match apply_action(&mut app, AppAction::SubmitInput, ctx).as_slice() {
            [AppCommand::SpawnPrompt(request)] => request.clone(),
            other => panic!("unexpected commands: {other:?}"),
        };
        assert_eq!(app.session.active_role().id, "swe");
        assert_eq!(app.session.active_skill().id, "default");

        let action = run_prompt(&backend, request, &SyntaxTheme::default()).await;
        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(
            body["messages"][0]["content"],
            "You are a software engineer. Be concise. fix this bug"
        );

        let commands = apply_action(&mut app, action, ctx);
        let transcript = commands
            .iter()
            .find_map(|command| match command {
                AppCommand::PersistTranscript { transcript, .. } => Some(transcript.clone()),
                _ => None,
            })
            .expect("exchange is persisted");
        assert!(transcript.starts_with("You: fix this bug\n\nGail: "));

        let temp = TempDir::new().unwrap();
        let store = StdMutex::new(HistoryStore::new(temp.path().join("gail_history")));
        let path = match persist_transcript(&store, &transcript, false) {
            AppAction::TranscriptSaved { path, .. } => path,
            other => panic!("unexpected action: {other:?}"),
        };
        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            saved,
            "You: fix this bug\n\nGail: Try X\n```rust\nfn main() {}\n```\n"
        );
        assert!(!saved.contains('\u{1b}'));
        assert!(path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with("_fix-this-bug.txt")));
    }

    #[test]
    fn persist_reports_saved_path() {
        let temp = TempDir::new().unwrap();
        let store = StdMutex::new(HistoryStore::new(temp.path()));

        let action = persist_transcript(&store, "You: hi\n\nGail: hello\n", true);

        match action {
            AppAction::TranscriptSaved { path, announce } => {
                assert!(announce);
                assert_eq!(
                    std::fs::read_to_string(path).unwrap(),
                    "You: hi\n\nGail: hello\n"
                );
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn keys_in_one_batch_see_mode_changes() {
        let mut app = create_test_app();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let press = |code, modifiers| {
            UiEvent::Crossterm(Event::Key(KeyEvent::new(code, modifiers)))
        };
        tx.send(press(KeyCode::Char('r'), KeyModifiers::CONTROL)).unwrap();
        tx.send(press(KeyCode::Down, KeyModifiers::NONE)).unwrap();
        tx.send(press(KeyCode::Enter, KeyModifiers::NONE)).unwrap();

        let mut commands = Vec::new();
        assert!(process_ui_events(
            &mut app,
            &mut rx,
            AppActionContext::default(),
            &mut commands
        ));

        assert_eq!(app.session.active_role().id, "writer");
        assert_eq!(app.ui.input_text(), "");
        assert_eq!(app.ui.mode, UiMode::TextInput);
    }

    #[test]
    fn background_results_are_applied_in_order() {
        let mut app = create_test_app();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(tx);
        dispatcher.dispatch_many(
            [
                AppAction::SetStatus {
                    message: "first".into(),
                },
                AppAction::SetStatus {
                    message: "second".into(),
                },
            ],
            AppActionContext::default(),
        );

        let mut commands = Vec::new();
        assert!(drain_action_queue(&mut app, &mut rx, &mut commands));
        assert_eq!(app.ui.status_text(), "second");
        assert_eq!(commands.len(), 2);
        assert!(!drain_action_queue(&mut app, &mut rx, &mut commands));
    }
}
