use serde::Deserialize;

use crate::error::RemoteError;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub fn parse_chat_reply(body: &[u8]) -> Result<String, RemoteError> {
    let resp: ChatCompletionResponse =
        serde_json::from_slice(body).map_err(|e| RemoteError::Malformed(e.to_string()))?;
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(RemoteError::EmptyReply)
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub fn parse_transcription(body: &[u8]) -> Result<String, RemoteError> {
    let resp: TranscriptionResponse =
        serde_json::from_slice(body).map_err(|e| RemoteError::Malformed(e.to_string()))?;
    Ok(resp.text)
}
