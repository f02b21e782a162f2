use crate::utils::highlight::HighlightedAnswer;

/// Display name used for the user's turns.
pub const USER_LABEL: &str = "You";
/// Display name used for the assistant's turns.
pub const ASSISTANT_LABEL: &str = "Gail";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => USER_LABEL,
            Speaker::Assistant => ASSISTANT_LABEL,
        }
    }
}

/// One entry in the conversation transcript.
///
/// `text` is the raw answer as returned by the backend; assistant turns also
/// carry the highlighted segments used for display.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub rendered: Option<HighlightedAnswer>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            rendered: None,
        }
    }

    pub fn assistant(answer: HighlightedAnswer) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: answer.source().to_string(),
            rendered: Some(answer),
        }
    }

    /// `"You: text"` / `"Gail: text"`.
    pub fn plain_line(&self) -> String {
        format!("{}: {}", self.speaker.label(), self.text)
    }
}
