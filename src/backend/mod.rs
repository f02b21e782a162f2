//! Remote model adapters behind a single capability contract.
//!
//! Each adapter screens input with the shared [`Validator`] before any
//! network traffic, then drives its own remote lifecycle:
//! - [`claude::ClaudeBackend`] resends the whole message list every turn.
//! - [`assistants::AssistantsBackend`] keeps a thread and a per-persona
//!   assistant, and polls runs to completion.
//! - [`responses::ResponsesBackend`] makes one stateless call per prompt.

pub mod assistants;
pub mod claude;
pub mod responses;
pub mod transport;

#[cfg(test)]
pub mod test_support;

use crate::core::message::ASSISTANT_LABEL;
use crate::core::models::ModelKind;
use crate::core::validator::{Validation, Validator};
use crate::utils::url::normalize_base_url;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use transport::{ApiRequest, HttpTransport, JsonTransport};

#[derive(Debug)]
pub enum BackendError {
    Transport {
        url: String,
        source: reqwest::Error,
    },
    Status {
        status: u16,
        body: String,
    },
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },
    Malformed(String),
    NotCompleted {
        status: String,
        details: String,
    },
    Timeout {
        attempts: u32,
        interval: Duration,
    },
    MissingThread,
    MissingAssistant,
    MissingCredential {
        var: &'static str,
    },
    /// Wraps a failure with the protocol step that produced it.
    Step {
        step: &'static str,
        source: Box<BackendError>,
    },
}

impl BackendError {
    pub fn at_step(step: &'static str) -> impl FnOnce(BackendError) -> BackendError {
        move |source| BackendError::Step {
            step,
            source: Box::new(source),
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            BackendError::Timeout { .. } => true,
            BackendError::Step { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport { url, source } => {
                write!(f, "Request to {url} failed: {source}")
            }
            BackendError::Status { status, body } => {
                write!(f, "API request failed with status {status}: {body}")
            }
            BackendError::Decode { what, source } => {
                write!(f, "Unable to decode {what}: {source}")
            }
            BackendError::Malformed(detail) => write!(f, "Unexpected response shape: {detail}"),
            BackendError::NotCompleted { status, details } => {
                if details.is_empty() {
                    write!(f, "Response not completed (status '{status}')")
                } else {
                    write!(f, "Response not completed (status '{status}'): {details}")
                }
            }
            BackendError::Timeout { attempts, interval } => write!(
                f,
                "Run did not complete with status 'completed' after {attempts} polls every {}s",
                interval.as_secs()
            ),
            BackendError::MissingThread => {
                write!(f, "No thread has been created for this conversation")
            }
            BackendError::MissingAssistant => {
                write!(f, "No assistant has been created for the current persona")
            }
            BackendError::MissingCredential { var } => {
                write!(f, "Missing API key: set the {var} environment variable")
            }
            BackendError::Step { step, source } => write!(f, "Failed to {step}: {source}"),
        }
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BackendError::Transport { source, .. } => Some(source),
            BackendError::Decode { source, .. } => Some(source),
            BackendError::Step { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Everything an adapter needs to answer one user message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptRequest {
    pub role_name: String,
    pub persona: String,
    pub instruction: String,
    pub message: String,
}

impl PromptRequest {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            persona: self.persona.clone(),
            instruction: self.instruction.clone(),
        }
    }

    /// `"{persona}. {instruction}."`
    pub fn combined_instructions(&self) -> String {
        format!("{}. {}.", self.persona, self.instruction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Answered(String),
    /// Input was refused locally; nothing was sent or recorded.
    Rejected(String),
}

/// The (persona, instruction) pair that produced the current remote context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    pub persona: String,
    pub instruction: String,
}

impl Fingerprint {
    pub fn changed_from(&self, applied: Option<&Fingerprint>) -> bool {
        applied != Some(self)
    }
}

/// Capability set shared by every adapter.
///
/// `prompt` mutates conversation state; callers must not run two prompts on
/// the same backend concurrently.
#[async_trait]
pub trait ChatBackend: Send {
    async fn prompt(&mut self, request: PromptRequest) -> Result<PromptOutcome, BackendError>;

    fn model(&self) -> &str;

    fn user(&self) -> &str;
}

/// Run the validator; `Some` means the prompt must short-circuit.
pub(crate) fn screen(validator: &Validator, message: &str) -> Option<PromptOutcome> {
    match validator.validate(message) {
        Validation::Valid => None,
        Validation::Rejected { message, .. } => Some(PromptOutcome::Rejected(message)),
    }
}

/// Connection parameters shared by all adapters.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub kind: ModelKind,
    pub api_key: String,
    pub base_url: String,
    pub user: String,
}

impl BackendSettings {
    /// Read the API key and optional base URL override for `kind`.
    pub fn from_env(kind: ModelKind) -> Result<Self, BackendError> {
        let var = kind.api_key_env();
        let api_key = std::env::var(var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(BackendError::MissingCredential { var })?;
        let base_url = std::env::var(kind.base_url_env())
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| kind.default_base_url().to_string());
        Ok(Self::new(kind, api_key, &base_url))
    }

    pub fn new(kind: ModelKind, api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            base_url: normalize_base_url(base_url),
            user: ASSISTANT_LABEL.to_string(),
        }
    }
}

/// The adapter selected at startup. Never switched at runtime.
pub enum Backend {
    Claude(claude::ClaudeBackend),
    Assistants(assistants::AssistantsBackend),
    Responses(responses::ResponsesBackend),
}

impl Backend {
    fn inner(&self) -> &dyn ChatBackend {
        match self {
            Backend::Claude(backend) => backend,
            Backend::Assistants(backend) => backend,
            Backend::Responses(backend) => backend,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ChatBackend {
        match self {
            Backend::Claude(backend) => backend,
            Backend::Assistants(backend) => backend,
            Backend::Responses(backend) => backend,
        }
    }
}

#[async_trait]
impl ChatBackend for Backend {
    async fn prompt(&mut self, request: PromptRequest) -> Result<PromptOutcome, BackendError> {
        self.inner_mut().prompt(request).await
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    fn user(&self) -> &str {
        self.inner().user()
    }
}

/// Build the adapter for `settings.kind`. The assistants adapter creates its
/// thread here, so a failure is a construction error.
pub async fn connect(
    settings: BackendSettings,
    validator: Arc<Validator>,
    transport: Arc<dyn JsonTransport>,
) -> Result<Backend, BackendError> {
    info!(model = %settings.kind, base_url = %settings.base_url, "connecting backend");
    let backend = match settings.kind {
        ModelKind::Claude => {
            Backend::Claude(claude::ClaudeBackend::new(settings, validator, transport))
        }
        ModelKind::Gpt => Backend::Assistants(
            assistants::AssistantsBackend::connect(settings, validator, transport).await?,
        ),
        ModelKind::Gpto => {
            Backend::Responses(responses::ResponsesBackend::new(settings, validator, transport))
        }
    };
    Ok(backend)
}
