//! JSON-over-HTTP plumbing shared by every adapter.
//!
//! Adapters build [`ApiRequest`] values and hand them to a [`JsonTransport`].
//! The production transport is reqwest-backed; tests substitute a scripted
//! implementation that records requests and replays canned payloads.

use crate::backend::BackendError;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[async_trait]
pub trait JsonTransport: Send + Sync {
    /// Perform the request and return the decoded JSON body of a 2xx reply.
    async fn send(&self, request: ApiRequest) -> Result<Value, BackendError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JsonTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, BackendError> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;

        debug!(%method, %url, "sending request");
        let mut builder = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json");
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| BackendError::Transport {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: pretty_error_body(&text),
            });
        }

        // Some endpoints reply with an empty body on success.
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|source| BackendError::Decode {
            what: "response body",
            source,
        })
    }
}

/// Pretty print a JSON error body; anything else is returned trimmed.
pub fn pretty_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_error_body_indents_json() {
        let pretty = pretty_error_body(r#"{"error":{"message":"bad key"}}"#);
        assert!(pretty.contains("\n"));
        assert!(pretty.contains("\"message\": \"bad key\""));
    }

    #[test]
    fn pretty_error_body_keeps_plain_text() {
        assert_eq!(pretty_error_body("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(pretty_error_body(""), "<empty>");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = ApiRequest::get("https://example.test").header("OpenAI-Beta", "assistants=v2");
        assert_eq!(request.header_value("openai-beta"), Some("assistants=v2"));
        assert_eq!(request.header_value("x-api-key"), None);
    }
}
