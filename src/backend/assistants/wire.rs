//! Request and response payloads of the assistants API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize)]
pub struct AssistantRequest<'a> {
    pub name: &'a str,
    pub description: String,
    pub model: &'a str,
    pub instructions: String,
    pub tools: Vec<Tool>,
    pub metadata: Map<String, Value>,
}

#[derive(Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Tool {
    pub fn code_interpreter() -> Self {
        Self {
            kind: "code_interpreter",
        }
    }
}

#[derive(Serialize)]
pub struct MessageRequest<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Serialize)]
pub struct RunRequest<'a> {
    pub assistant_id: &'a str,
}

/// Threads, assistants and runs all answer with at least an `id`.
#[derive(Deserialize)]
pub struct Created {
    pub id: String,
}

#[derive(Deserialize)]
pub struct RunStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
pub struct ThreadMessage {
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

#[derive(Deserialize)]
pub struct MessageContent {
    pub text: Option<MessageText>,
}

#[derive(Deserialize)]
pub struct MessageText {
    #[serde(default)]
    pub value: String,
}

impl MessageList {
    /// Text of the newest message's first content block.
    pub fn latest_text(self) -> Option<String> {
        self.data
            .into_iter()
            .next()?
            .content
            .into_iter()
            .next()?
            .text
            .map(|text| text.value)
    }
}
