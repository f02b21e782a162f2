//! Stateful adapter built on threads, assistants and runs.
//!
//! A thread is created once when the adapter is built and reused for the
//! whole process. An assistant carries the persona and instruction and is
//! replaced whenever that pair changes; the thread, and with it every earlier
//! turn, is kept. Each prompt then posts a message, starts a run and polls it
//! until it completes.

pub mod run;
mod wire;

#[cfg(test)]
mod tests;

use crate::backend::transport::{ApiRequest, JsonTransport};
use crate::backend::{
    screen, BackendError, BackendSettings, ChatBackend, Fingerprint, PromptOutcome, PromptRequest,
};
use crate::core::validator::Validator;
use crate::utils::url::construct_api_url;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub use run::{poll_until_completed, PollPolicy};
use wire::{AssistantRequest, Created, MessageList, MessageRequest, RunRequest, RunStatus, Tool};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

pub struct AssistantsBackend {
    settings: BackendSettings,
    model: String,
    validator: Arc<Validator>,
    transport: Arc<dyn JsonTransport>,
    poll: PollPolicy,
    thread_id: String,
    assistant_id: Option<String>,
    applied: Option<Fingerprint>,
}

impl AssistantsBackend {
    /// Build the adapter and create its conversation thread.
    pub async fn connect(
        settings: BackendSettings,
        validator: Arc<Validator>,
        transport: Arc<dyn JsonTransport>,
    ) -> Result<Self, BackendError> {
        let mut backend = Self {
            model: settings.kind.model_name().to_string(),
            settings,
            validator,
            transport,
            poll: PollPolicy::default(),
            thread_id: String::new(),
            assistant_id: None,
            applied: None,
        };

        let thread: Created = backend
            .post("threads", &Map::new())
            .await
            .map_err(BackendError::at_step("create a thread"))?;
        info!(thread_id = %thread.id, "created thread");
        backend.thread_id = thread.id;
        Ok(backend)
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    fn request(&self, request: ApiRequest) -> ApiRequest {
        request
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|source| BackendError::Decode {
            what: "request body",
            source,
        })?;
        let url = construct_api_url(&self.settings.base_url, endpoint);
        let raw = self.transport.send(self.request(ApiRequest::post(url, body))).await?;
        decode(raw)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, BackendError> {
        let url = construct_api_url(&self.settings.base_url, endpoint);
        let raw = self.transport.send(self.request(ApiRequest::get(url))).await?;
        decode(raw)
    }

    async fn create_assistant(&self, request: &PromptRequest) -> Result<String, BackendError> {
        let body = AssistantRequest {
            name: &request.role_name,
            description: format!("Gail: {}", request.persona),
            model: &self.model,
            instructions: request.combined_instructions(),
            tools: vec![Tool::code_interpreter()],
            metadata: Map::new(),
        };
        let created: Created = self.post("assistants", &body).await?;
        Ok(created.id)
    }

    async fn post_message(&self, content: &str) -> Result<(), BackendError> {
        let endpoint = format!("threads/{}/messages", self.thread_id);
        let body = MessageRequest {
            role: "user",
            content,
        };
        let _: Value = self.post(&endpoint, &body).await?;
        Ok(())
    }

    async fn create_run(&self, assistant_id: &str) -> Result<String, BackendError> {
        let endpoint = format!("threads/{}/runs", self.thread_id);
        let created: Created = self.post(&endpoint, &RunRequest { assistant_id }).await?;
        Ok(created.id)
    }

    async fn run_status(&self, run_id: &str) -> Result<String, BackendError> {
        let endpoint = format!("threads/{}/runs/{}", self.thread_id, run_id);
        let run: RunStatus = self.get(&endpoint).await?;
        Ok(run.status)
    }

    async fn latest_answer(&self) -> Result<String, BackendError> {
        let endpoint = format!("threads/{}/messages", self.thread_id);
        let list: MessageList = self.get(&endpoint).await?;
        list.latest_text()
            .ok_or_else(|| BackendError::Malformed("thread has no message text".into()))
    }
}

fn decode<T: DeserializeOwned>(raw: Value) -> Result<T, BackendError> {
    serde_json::from_value(raw).map_err(|source| BackendError::Decode {
        what: "assistants response",
        source,
    })
}

#[async_trait]
impl ChatBackend for AssistantsBackend {
    async fn prompt(&mut self, request: PromptRequest) -> Result<PromptOutcome, BackendError> {
        if let Some(rejected) = screen(&self.validator, &request.message) {
            return Ok(rejected);
        }
        if self.thread_id.is_empty() {
            return Err(BackendError::MissingThread);
        }

        // Context first, then message, then run.
        let fingerprint = request.fingerprint();
        if fingerprint.changed_from(self.applied.as_ref()) {
            let assistant_id = self
                .create_assistant(&request)
                .await
                .map_err(BackendError::at_step("create an assistant"))?;
            info!(assistant_id = %assistant_id, role = %request.role_name, "bound new assistant");
            self.assistant_id = Some(assistant_id);
            self.applied = Some(fingerprint);
        }
        let assistant_id = self
            .assistant_id
            .clone()
            .ok_or(BackendError::MissingAssistant)?;

        self.post_message(&request.message)
            .await
            .map_err(BackendError::at_step("post a message"))?;

        let run_id = self
            .create_run(&assistant_id)
            .await
            .map_err(BackendError::at_step("create a run"))?;
        debug!(run_id = %run_id, "run submitted");

        poll_until_completed(self.poll, || self.run_status(&run_id))
            .await
            .map_err(BackendError::at_step("poll the run"))?;

        let answer = self
            .latest_answer()
            .await
            .map_err(BackendError::at_step("fetch the response"))?;
        Ok(PromptOutcome::Answered(answer))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn user(&self) -> &str {
        &self.settings.user
    }
}
