//! Transcription requests.
//!
//! The hosted model is addressed as `{endpoint}/{model}` and takes the raw
//! audio bytes as the request body. The payload arrives here base64-encoded
//! (that is its transport form on the client side) and is decoded before
//! dispatch.

use base64::Engine;

use crate::config::TranscriptionBackendConfig;
use crate::error::RemoteError;
use crate::request::{Body, HttpRequest};

pub fn decode_speech_payload(base64_payload: &str) -> Result<Vec<u8>, RemoteError> {
    base64::engine::general_purpose::STANDARD
        .decode(base64_payload)
        .map_err(|e| RemoteError::InvalidPayload(e.to_string()))
}

pub fn build_transcription_request(
    cfg: &TranscriptionBackendConfig,
    audio: Vec<u8>,
) -> HttpRequest {
    HttpRequest {
        method: "POST".into(),
        url: crate::chat::join_url(&cfg.endpoint, &cfg.model),
        headers: vec![
            ("Content-Type".into(), "application/octet-stream".into()),
            ("Accept".into(), "application/json".into()),
            ("Authorization".into(), format!("Bearer {}", cfg.api_key)),
        ],
        body: Body::Bytes(audio),
    }
}
