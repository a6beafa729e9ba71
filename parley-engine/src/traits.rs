use async_trait::async_trait;

use parley_audio::EncodedSpeech;
use parley_core::ReplyRequest;
use parley_providers::RemoteError;

/// Chat-completion boundary: the accumulated history plus the new turn go
/// out, one reply comes back.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    async fn reply(&self, request: &ReplyRequest) -> Result<String, RemoteError>;

    /// Opening message for a fresh conversation in `language`.
    async fn greet(&self, language: &str) -> Result<String, RemoteError>;
}

/// Transcription boundary: encoded speech in, recognized text out.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(
        &self,
        speech: &EncodedSpeech,
        language: &str,
    ) -> Result<String, RemoteError>;
}
