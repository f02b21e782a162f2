use crate::backend::transport::{ApiRequest, JsonTransport};
use crate::backend::{screen, BackendError, BackendSettings, ChatBackend, PromptOutcome, PromptRequest};
use crate::core::validator::Validator;
use crate::utils::url::construct_api_url;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const REASONING_EFFORT: &str = "medium";

#[derive(Serialize)]
struct ResponseRequest<'a> {
    model: &'a str,
    instructions: String,
    input: &'a str,
    user: &'a str,
    max_output_tokens: u32,
    reasoning: Reasoning,
}

#[derive(Serialize)]
struct Reasoning {
    effort: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: Value,
    #[serde(default)]
    pub incomplete_details: Value,
    #[serde(default)]
    pub output: Vec<OutputEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputEntry {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
pub struct OutputContent {
    #[serde(default)]
    pub text: String,
}

/// Pull the answer out of a responses payload.
///
/// The first output entry is the reasoning summary; the answer lives in the
/// second one. Status is checked before shape so an unfinished response is
/// never reported as malformed.
pub fn extract_answer(body: ResponseBody) -> Result<String, BackendError> {
    if body.status != "completed" {
        let details = [&body.error, &body.incomplete_details]
            .into_iter()
            .filter(|value| !value.is_null())
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(BackendError::NotCompleted {
            status: body.status,
            details,
        });
    }

    let count = body.output.len();
    let entry = body.output.into_iter().nth(1).ok_or_else(|| {
        BackendError::Malformed(format!("expected at least 2 output entries, got {count}"))
    })?;
    entry
        .content
        .into_iter()
        .next()
        .map(|content| content.text)
        .ok_or_else(|| BackendError::Malformed("no content in output[1]".into()))
}

/// Single-call adapter with a fixed reasoning effort. Keeps no remote state.
pub struct ResponsesBackend {
    settings: BackendSettings,
    model: String,
    validator: Arc<Validator>,
    transport: Arc<dyn JsonTransport>,
}

impl ResponsesBackend {
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
        }
    }
}

#[async_trait]
impl ChatBackend for ResponsesBackend {
    async fn prompt(&mut self, request: PromptRequest) -> Result<PromptOutcome, BackendError> {
        if let Some(rejected) = screen(&self.validator, &request.message) {
            return Ok(rejected);
        }

        let body = serde_json::to_value(ResponseRequest {
            model: &self.model,
            instructions: request.combined_instructions(),
            input: &request.message,
            user: &self.settings.user,
            max_output_tokens: self.settings.kind.max_tokens(),
            reasoning: Reasoning {
                effort: REASONING_EFFORT,
            },
        })
        .map_err(|source| BackendError::Decode {
            what: "responses request",
            source,
        })?;

        debug!(model = %self.model, "requesting response");
        let api_request = ApiRequest::post(construct_api_url(&self.settings.base_url, "responses"), body)
            .header("Authorization", format!("Bearer {}", self.settings.api_key));
        let raw = self.transport.send(api_request).await?;

        let parsed: ResponseBody =
            serde_json::from_value(raw).map_err(|source| BackendError::Decode {
                what: "responses payload",
                source,
            })?;
        let answer = extract_answer(parsed).inspect_err(|err| warn!(error = %err, "unusable response"))?;
        Ok(PromptOutcome::Answered(answer))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn user(&self) -> &str {
        &self.settings.user
    }
}
