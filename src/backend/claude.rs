use crate::backend::transport::{ApiRequest, JsonTransport};
use crate::backend::{
    screen, BackendError, BackendSettings, ChatBackend, Fingerprint, PromptOutcome, PromptRequest,
};
use crate::core::validator::Validator;
use crate::utils::url::construct_api_url;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: String,
}

impl ClaudeMessage {
    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }

    fn assistant(content: String) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ClaudeMessage],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Stateless multi-turn adapter: the full message list is resent each turn
/// and persona changes are folded into the next user message.
pub struct ClaudeBackend {
    settings: BackendSettings,
    model: String,
    validator: Arc<Validator>,
    transport: Arc<dyn JsonTransport>,
    messages: Vec<ClaudeMessage>,
    applied: Option<Fingerprint>,
}

impl ClaudeBackend {
    pub fn new(
        settings: BackendSettings,
        validator: Arc<Validator>,
        transport: Arc<dyn JsonTransport>,
    ) -> Self {
        Self {
            model: settings.kind.model_name().to_string(),
            settings,
            validator,
            transport,
            messages: Vec::new(),
            applied: None,
        }
    }

    pub fn messages(&self) -> &[ClaudeMessage] {
        &self.messages
    }

    fn outgoing_content(&self, request: &PromptRequest, fingerprint: &Fingerprint) -> String {
        if fingerprint.changed_from(self.applied.as_ref()) {
            format!(
                "{}. {}. {}",
                request.persona, request.instruction, request.message
            )
        } else {
            request.message.clone()
        }
    }
}

#[async_trait]
impl ChatBackend for ClaudeBackend {
    async fn prompt(&mut self, request: PromptRequest) -> Result<PromptOutcome, BackendError> {
        if let Some(rejected) = screen(&self.validator, &request.message) {
            return Ok(rejected);
        }

        let fingerprint = request.fingerprint();
        let content = self.outgoing_content(&request, &fingerprint);

        let mut messages = self.messages.clone();
        messages.push(ClaudeMessage::user(content));

        let body = serde_json::to_value(MessagesRequest {
            model: &self.model,
            max_tokens: self.settings.kind.max_tokens(),
            messages: &messages,
        })
        .map_err(|source| BackendError::Decode {
            what: "messages request",
            source,
        })?;

        debug!(turns = messages.len(), "posting claude messages");
        let api_request = ApiRequest::post(construct_api_url(&self.settings.base_url, "messages"), body)
            .header("x-api-key", self.settings.api_key.clone())
            .header("anthropic-version", ANTHROPIC_VERSION);
        let raw = self.transport.send(api_request).await?;

        let response: MessagesResponse =
            serde_json::from_value(raw).map_err(|source| BackendError::Decode {
                what: "claude message response",
                source,
            })?;
        if let Some(usage) = &response.usage {
            info!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "claude usage"
            );
        }
        let answer = response
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| BackendError::Malformed("response has no content blocks".into()))?;

        messages.push(ClaudeMessage::assistant(answer.clone()));
        self.messages = messages;
        self.applied = Some(fingerprint);
        Ok(PromptOutcome::Answered(answer))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn user(&self) -> &str {
        &self.settings.user
    }
}
