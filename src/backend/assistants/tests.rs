use super::*;
use crate::backend::test_support::{email_validator, permissive_validator, ScriptedTransport};
use crate::core::models::ModelKind;
use reqwest::Method;
use serde_json::json;
use std::time::Duration;

const BASE: &str = "https://api.openai.test/v1";

async fn connected(transport: Arc<ScriptedTransport>, validator: Arc<Validator>) -> AssistantsBackend {
    transport.push(Ok(json!({"id": "thread_abc", "object": "thread"})));
    AssistantsBackend::connect(
        BackendSettings::new(ModelKind::Gpt, "sk-test", BASE),
        validator,
        transport,
    )
    .await
    .expect("thread creation")
    .with_poll_policy(PollPolicy {
        interval: Duration::ZERO,
        max_attempts: 20,
    })
}

fn request(persona: &str, instruction: &str, message: &str) -> PromptRequest {
    PromptRequest {
        role_name: "Software Engineer".into(),
        persona: persona.into(),
        instruction: instruction.into(),
        message: message.into(),
    }
}

/// Replies for one full exchange after the assistant step.
fn exchange_replies(transport: &ScriptedTransport, run_id: &str, answer: &str) {
    transport.push(Ok(json!({"id": "msg_user"})));
    transport.push(Ok(json!({"id": run_id, "status": "queued"})));
    transport.push(Ok(json!({"id": run_id, "status": "queued"})));
    transport.push(Ok(json!({"id": run_id, "status": "in_progress"})));
    transport.push(Ok(json!({"id": run_id, "status": "completed"})));
    transport.push(Ok(json!({
        "object": "list",
        "data": [
            {"role": "assistant", "content": [{"type": "text", "text": {"value": answer, "annotations": []}}]},
            {"role": "user", "content": [{"type": "text", "text": {"value": "older", "annotations": []}}]}
        ]
    })));
}

#[tokio::test]
async fn full_exchange_follows_context_message_run_order() {
    let transport = ScriptedTransport::new(vec![]);
    let mut gpt = connected(transport.clone(), permissive_validator()).await;
    transport.push(Ok(json!({"id": "asst_1"})));
    exchange_replies(&transport, "run_1", "Try X");

    let outcome = gpt
        .prompt(request("You are an engineer", "Be concise", "fix this bug"))
        .await
        .unwrap();

    assert_eq!(outcome, PromptOutcome::Answered("Try X".into()));
    assert_eq!(transport.remaining(), 0);
    let sent = transport.requests();
    let urls: Vec<(Method, String)> = sent
        .iter()
        .map(|r| (r.method.clone(), r.url.trim_start_matches(BASE).to_string()))
        .collect();
    assert_eq!(
        urls,
        vec![
            (Method::POST, "/threads".to_string()),
            (Method::POST, "/assistants".to_string()),
            (Method::POST, "/threads/thread_abc/messages".to_string()),
            (Method::POST, "/threads/thread_abc/runs".to_string()),
            (Method::GET, "/threads/thread_abc/runs/run_1".to_string()),
            (Method::GET, "/threads/thread_abc/runs/run_1".to_string()),
            (Method::GET, "/threads/thread_abc/runs/run_1".to_string()),
            (Method::GET, "/threads/thread_abc/messages".to_string()),
        ]
    );
    assert!(sent
        .iter()
        .all(|r| r.header_value("OpenAI-Beta") == Some("assistants=v2")));
    assert_eq!(sent[1].header_value("Authorization"), Some("Bearer sk-test"));

    let assistant = sent[1].body.as_ref().unwrap();
    assert_eq!(assistant["name"], "Software Engineer");
    assert_eq!(assistant["description"], "Gail: You are an engineer");
    assert_eq!(assistant["instructions"], "You are an engineer. Be concise.");
    assert_eq!(assistant["model"], "gpt-4o");
    assert_eq!(assistant["tools"][0]["type"], "code_interpreter");

    // The message carries the raw text; persona lives on the assistant.
    let message = sent[2].body.as_ref().unwrap();
    assert_eq!(message["role"], "user");
    assert_eq!(message["content"], "fix this bug");
    assert_eq!(sent[3].body.as_ref().unwrap()["assistant_id"], "asst_1");
}

#[tokio::test]
async fn same_persona_reuses_assistant_and_thread() {
    let transport = ScriptedTransport::new(vec![]);
    let mut gpt = connected(transport.clone(), permissive_validator()).await;
    transport.push(Ok(json!({"id": "asst_1"})));
    exchange_replies(&transport, "run_1", "one");
    exchange_replies(&transport, "run_2", "two");

    gpt.prompt(request("P", "I", "first")).await.unwrap();
    let before = transport.request_count();
    let outcome = gpt.prompt(request("P", "I", "second")).await.unwrap();

    assert_eq!(outcome, PromptOutcome::Answered("two".into()));
    let second_round = &transport.requests()[before..];
    assert!(second_round.iter().all(|r| !r.url.ends_with("/assistants")));
    assert_eq!(gpt.thread_id(), "thread_abc");
    assert_eq!(gpt.assistant_id(), Some("asst_1"));
}

#[tokio::test]
async fn persona_change_swaps_assistant_but_keeps_thread() {
    let transport = ScriptedTransport::new(vec![]);
    let mut gpt = connected(transport.clone(), permissive_validator()).await;
    transport.push(Ok(json!({"id": "asst_1"})));
    exchange_replies(&transport, "run_1", "one");
    transport.push(Ok(json!({"id": "asst_2"})));
    exchange_replies(&transport, "run_2", "two");

    gpt.prompt(request("P", "I", "first")).await.unwrap();
    gpt.prompt(request("Q", "I", "second")).await.unwrap();

    assert_eq!(gpt.assistant_id(), Some("asst_2"));
    assert_eq!(gpt.thread_id(), "thread_abc");
    let runs: Vec<_> = transport
        .requests()
        .into_iter()
        .filter(|r| r.url.ends_with("/runs"))
        .collect();
    assert_eq!(runs[1].body.as_ref().unwrap()["assistant_id"], "asst_2");
    assert!(runs[1].url.contains("thread_abc"));
}

#[tokio::test]
async fn assistant_failure_is_retryable() {
    let transport = ScriptedTransport::new(vec![]);
    let mut gpt = connected(transport.clone(), permissive_validator()).await;
    transport.push(Err(BackendError::Status {
        status: 500,
        body: "oops".into(),
    }));

    let err = gpt.prompt(request("P", "I", "hello")).await.unwrap_err();
    assert!(err.to_string().contains("create an assistant"));
    assert_eq!(gpt.assistant_id(), None);

    transport.push(Ok(json!({"id": "asst_1"})));
    exchange_replies(&transport, "run_1", "hi");
    let outcome = gpt.prompt(request("P", "I", "hello")).await.unwrap();
    assert_eq!(outcome, PromptOutcome::Answered("hi".into()));
}

#[tokio::test]
async fn run_timeout_is_reported_and_state_survives() {
    let transport = ScriptedTransport::new(vec![]);
    let mut gpt = connected(transport.clone(), permissive_validator()).await;
    transport.push(Ok(json!({"id": "asst_1"})));
    transport.push(Ok(json!({"id": "msg_user"})));
    transport.push(Ok(json!({"id": "run_1", "status": "queued"})));
    for _ in 0..20 {
        transport.push(Ok(json!({"id": "run_1", "status": "in_progress"})));
    }
    transport.push(Ok(json!({"id": "left-over"})));

    let err = gpt.prompt(request("P", "I", "slow")).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(transport.remaining(), 1, "no 21st poll");
    assert_eq!(gpt.assistant_id(), Some("asst_1"));
    assert_eq!(gpt.thread_id(), "thread_abc");
}

#[tokio::test]
async fn empty_message_list_is_malformed() {
    let transport = ScriptedTransport::new(vec![]);
    let mut gpt = connected(transport.clone(), permissive_validator()).await;
    transport.push(Ok(json!({"id": "asst_1"})));
    transport.push(Ok(json!({"id": "msg_user"})));
    transport.push(Ok(json!({"id": "run_1", "status": "queued"})));
    transport.push(Ok(json!({"id": "run_1", "status": "completed"})));
    transport.push(Ok(json!({"object": "list", "data": []})));

    let err = gpt.prompt(request("P", "I", "hello")).await.unwrap_err();
    match err {
        BackendError::Step { step, source } => {
            assert_eq!(step, "fetch the response");
            assert!(matches!(*source, BackendError::Malformed(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn rejected_input_skips_every_remote_step() {
    let transport = ScriptedTransport::new(vec![]);
    let mut gpt = connected(transport.clone(), email_validator()).await;
    let after_connect = transport.request_count();

    let outcome = gpt
        .prompt(request("P", "I", "contact me at a@b.com"))
        .await
        .unwrap();

    assert!(matches!(outcome, PromptOutcome::Rejected(_)));
    assert_eq!(transport.request_count(), after_connect);
    assert_eq!(gpt.assistant_id(), None);
}
