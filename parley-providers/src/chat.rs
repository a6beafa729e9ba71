//! Chat-completion requests.
//!
//! The conversation history travels as paired past inputs/replies plus the
//! new text as its own field; here it is interleaved into the alternating
//! message list the completion endpoint expects, behind a system message
//! that pins the reply language.

use serde_json::json;

use parley_core::ReplyRequest;

use crate::config::ChatBackendConfig;
use crate::request::{Body, HttpRequest};

pub fn build_reply_request(cfg: &ChatBackendConfig, request: &ReplyRequest) -> HttpRequest {
    let mut messages = vec![json!({
        "role": "system",
        "content": reply_system_message(&request.language),
    })];
    for (user, bot) in request
        .past_user_inputs
        .iter()
        .zip(request.past_bot_replies.iter())
    {
        messages.push(json!({"role": "user", "content": user}));
        messages.push(json!({"role": "assistant", "content": bot}));
    }
    messages.push(json!({"role": "user", "content": request.text}));

    completion_request(cfg, messages)
}

/// Opening message for a fresh conversation: system message only, no history.
pub fn build_greeting_request(cfg: &ChatBackendConfig, language: &str) -> HttpRequest {
    let messages = vec![json!({
        "role": "system",
        "content": greeting_system_message(language),
    })];

    completion_request(cfg, messages)
}

fn completion_request(cfg: &ChatBackendConfig, messages: Vec<serde_json::Value>) -> HttpRequest {
    let payload = json!({
        "model": cfg.model,
        "messages": messages,
        "temperature": cfg.temperature,
        "max_tokens": cfg.max_tokens,
        "top_p": cfg.top_p,
        "frequency_penalty": cfg.frequency_penalty,
        "presence_penalty": cfg.presence_penalty,
    });

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.endpoint, "/chat/completions"),
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("Authorization".into(), format!("Bearer {}", cfg.api_key)),
        ],
        body: Body::Json(payload.to_string()),
    }
}

fn reply_system_message(language: &str) -> String {
    format!(
        "You are a friendly conversation partner helping someone practice {language}. \
         Always answer in {language}, in one or two short sentences."
    )
}

fn greeting_system_message(language: &str) -> String {
    format!(
        "You are a friendly conversation partner helping someone practice {language}. \
         Open the conversation in {language} with a short greeting and one simple question."
    )
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
