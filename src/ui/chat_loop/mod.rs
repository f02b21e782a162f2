//! Interactive chat loop.
//!
//! [`run_chat`] takes a fully constructed [`App`](crate::core::app::App) and
//! the collaborators it needs at runtime, sets up the terminal and drives the
//! event loop until the user quits.

mod event_loop;
pub mod keybindings;
pub mod lifecycle;

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

use crate::backend::Backend;
use crate::ui::theme::Theme;
use crate::utils::highlight::SyntaxTheme;
use crate::utils::history::HistoryStore;

pub use event_loop::{persist_transcript, run_chat, run_prompt, UiEvent};

/// Long-lived collaborators shared with background tasks.
pub struct ChatServices {
    /// Locked for the duration of a prompt; the Loading mode keeps it
    /// uncontended.
    pub backend: Arc<Mutex<Backend>>,
    pub history: Arc<StdMutex<HistoryStore>>,
    pub syntax_theme: Arc<SyntaxTheme>,
    pub theme: Theme,
    pub editor: String,
}

impl ChatServices {
    pub fn new(
        backend: Backend,
        history: HistoryStore,
        syntax_theme: SyntaxTheme,
        theme: Theme,
        editor: impl Into<String>,
    ) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            history: Arc::new(StdMutex::new(history)),
            syntax_theme: Arc::new(syntax_theme),
            theme,
            editor: editor.into(),
        }
    }
}
