//! HTTP-backed implementations of the provider seams.
//!
//! Both clients validate the language tag against the allow-list before
//! building a request: an off-list tag never costs a network round trip,
//! even though the store performs the same check on its side.

use async_trait::async_trait;

use parley_audio::EncodedSpeech;
use parley_core::{ReplyRequest, is_allowed_language};
use parley_providers::chat::{build_greeting_request, build_reply_request};
use parley_providers::parse::{parse_chat_reply, parse_transcription};
use parley_providers::runtime::{HttpResponse, execute};
use parley_providers::transcription::{build_transcription_request, decode_speech_payload};
use parley_providers::{ChatBackendConfig, RemoteError, TranscriptionBackendConfig};

use crate::traits::{ReplyProvider, TranscriptionProvider};

pub struct HttpReplyClient {
    cfg: ChatBackendConfig,
}

impl HttpReplyClient {
    pub fn new(cfg: ChatBackendConfig) -> Self {
        Self { cfg }
    }

    pub fn from_env() -> Self {
        Self::new(ChatBackendConfig::from_env())
    }

    fn checked(resp: HttpResponse) -> Result<HttpResponse, RemoteError> {
        if resp.is_success() {
            Ok(resp)
        } else {
            Err(RemoteError::Backend {
                status: resp.status,
                message: resp.text_lossy(),
            })
        }
    }
}

#[async_trait]
impl ReplyProvider for HttpReplyClient {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, RemoteError> {
        if !is_allowed_language(&request.language) {
            return Err(RemoteError::UnsupportedLanguage(request.language.clone()));
        }

        let req = build_reply_request(&self.cfg, request);
        let resp = Self::checked(execute(&req, self.cfg.timeout()).await?)?;
        non_empty(parse_chat_reply(&resp.body)?)
    }

    async fn greet(&self, language: &str) -> Result<String, RemoteError> {
        if !is_allowed_language(language) {
            return Err(RemoteError::UnsupportedLanguage(language.to_string()));
        }

        let req = build_greeting_request(&self.cfg, language);
        let resp = Self::checked(execute(&req, self.cfg.timeout()).await?)?;
        non_empty(parse_chat_reply(&resp.body)?)
    }
}

pub struct HttpTranscriptionClient {
    cfg: TranscriptionBackendConfig,
}

impl HttpTranscriptionClient {
    pub fn new(cfg: TranscriptionBackendConfig) -> Self {
        Self { cfg }
    }

    pub fn from_env() -> Self {
        Self::new(TranscriptionBackendConfig::from_env())
    }
}

#[async_trait]
impl TranscriptionProvider for HttpTranscriptionClient {
    async fn transcribe(
        &self,
        speech: &EncodedSpeech,
        language: &str,
    ) -> Result<String, RemoteError> {
        if !is_allowed_language(language) {
            return Err(RemoteError::UnsupportedLanguage(language.to_string()));
        }

        let audio = decode_speech_payload(&speech.base64)?;
        let req = build_transcription_request(&self.cfg, audio);
        let resp = execute(&req, self.cfg.timeout()).await?;
        if !resp.is_success() {
            return Err(RemoteError::Backend {
                status: resp.status,
                message: resp.text_lossy(),
            });
        }

        non_empty(parse_transcription(&resp.body)?)
    }
}

fn non_empty(text: String) -> Result<String, RemoteError> {
    let text = text.trim();
    if text.is_empty() {
        Err(RemoteError::EmptyReply)
    } else {
        Ok(text.to_string())
    }
}
