use crate::backend::transport::{ApiRequest, JsonTransport};
use crate::backend::BackendError;
use crate::core::config::ValidationRule;
use crate::core::validator::Validator;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// In-memory transport that replays canned replies in order and records
/// every request it receives.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, BackendError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<Value, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, reply: Result<Value, BackendError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl JsonTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted reply left for {}", request.url))
    }
}

pub fn permissive_validator() -> Arc<Validator> {
    Arc::new(Validator::default())
}

pub fn email_validator() -> Arc<Validator> {
    Arc::new(
        Validator::new(&[ValidationRule {
            name: "email".into(),
            pattern: r"\S+@\S+".into(),
        }])
        .unwrap(),
    )
}
