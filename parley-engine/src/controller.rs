//! Session orchestration.
//!
//! One `SessionController` owns one conversation and one capture for the
//! session's lifetime. It is the only mutator of either: the view layer
//! reads snapshots and calls the handful of verbs below.
//!
//! Lock discipline: the conversation and capture mutexes guard short
//! critical sections and are never held across an await. The in-flight gate
//! is taken inside the same critical section that records the user's turn,
//! so a second submit issued before the first resolves is rejected, not
//! queued.

use std::sync::{Arc, Mutex};

use parley_audio::{AudioCapture, AudioCaptureError, EncodedSpeech};
use parley_core::{Conversation, Language, SessionId, Speaker, Turn};
use parley_providers::RemoteError;

use crate::clients::{HttpReplyClient, HttpTranscriptionClient};
use crate::traits::{ReplyProvider, TranscriptionProvider};

/// Why a submit attempt was refused without touching the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    NoLanguage,
    ReplyInFlight,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    Replied(String),
    /// The optimistic user turn stands; the remote call failed or came back
    /// empty. The transcript shows an unanswered turn.
    Unanswered(RemoteError),
}

#[derive(Debug)]
pub enum VoiceOutcome {
    CaptureFailed(AudioCaptureError),
    NoSpeech,
    Rejected(RejectReason),
    TranscriptionFailed(RemoteError),
    Submitted {
        transcript: String,
        outcome: SubmitOutcome,
    },
}

#[derive(Clone)]
pub struct SessionController {
    conversation: Arc<Mutex<Conversation>>,
    capture: Arc<Mutex<AudioCapture>>,
    reply: Arc<dyn ReplyProvider>,
    transcription: Arc<dyn TranscriptionProvider>,
}

impl SessionController {
    pub fn new(
        reply: Arc<dyn ReplyProvider>,
        transcription: Arc<dyn TranscriptionProvider>,
    ) -> Self {
        Self {
            conversation: Arc::new(Mutex::new(Conversation::new())),
            capture: Arc::new(Mutex::new(AudioCapture::new())),
            reply,
            transcription,
        }
    }

    /// Controller wired to the env-configured HTTP backends.
    pub fn from_env() -> Self {
        Self::new(
            Arc::new(HttpReplyClient::from_env()),
            Arc::new(HttpTranscriptionClient::from_env()),
        )
    }

    pub fn session_id(&self) -> SessionId {
        self.conversation.lock().unwrap().id()
    }

    pub fn set_language(&self, tag: &str) {
        self.conversation.lock().unwrap().set_language(tag);
    }

    pub fn language(&self) -> Option<Language> {
        self.conversation.lock().unwrap().language()
    }

    pub fn set_pending_input(&self, text: &str) {
        self.conversation.lock().unwrap().set_pending_input(text);
    }

    pub fn pending_input(&self) -> String {
        self.conversation.lock().unwrap().pending_input().to_string()
    }

    pub fn chat_enabled(&self) -> bool {
        self.conversation.lock().unwrap().chat_enabled()
    }

    /// Explicit "bot is typing" signal for the view layer.
    pub fn awaiting_reply(&self) -> bool {
        self.conversation.lock().unwrap().awaiting_reply()
    }

    pub fn transcript(&self) -> Vec<Turn> {
        self.conversation.lock().unwrap().transcript().to_vec()
    }

    pub fn user_texts(&self) -> Vec<String> {
        self.conversation.lock().unwrap().user_texts()
    }

    pub fn bot_texts(&self) -> Vec<String> {
        self.conversation.lock().unwrap().bot_texts()
    }

    /// Submit one user turn and wait for the reply.
    ///
    /// The user's words are recorded before the remote call goes out and are
    /// never rolled back: a failed call leaves an unanswered turn, not a
    /// silently swallowed one.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            log::warn!("rejected submit: empty input");
            return SubmitOutcome::Rejected(RejectReason::EmptyInput);
        }

        let request = {
            let mut convo = self.conversation.lock().unwrap();
            if !convo.begin_exchange() {
                let reason = if convo.language().is_none() {
                    RejectReason::NoLanguage
                } else {
                    RejectReason::ReplyInFlight
                };
                log::warn!("session {}: rejected submit: {reason:?}", convo.id());
                return SubmitOutcome::Rejected(reason);
            }

            convo.append_turn(Speaker::User, text);
            match convo.reply_request(text) {
                Some(request) => request,
                None => {
                    // begin_exchange guarantees a language; keep the gate
                    // consistent regardless.
                    convo.finish_exchange();
                    return SubmitOutcome::Rejected(RejectReason::NoLanguage);
                }
            }
        };

        let result = self.reply.reply(&request).await;

        let mut convo = self.conversation.lock().unwrap();
        convo.finish_exchange();
        match result {
            Ok(reply) => {
                convo.append_turn(Speaker::Bot, reply.as_str());
                convo.clear_pending_input();
                SubmitOutcome::Replied(reply)
            }
            Err(e) => {
                log::warn!("session {}: turn went unanswered: {e}", convo.id());
                SubmitOutcome::Unanswered(e)
            }
        }
    }

    /// Ask the backend to open the conversation in the session language.
    /// The greeting is a lone bot turn; it never enters the paired history.
    pub async fn greet(&self) -> SubmitOutcome {
        let language = {
            let mut convo = self.conversation.lock().unwrap();
            let Some(language) = convo.language() else {
                log::warn!("session {}: rejected greeting: no language chosen", convo.id());
                return SubmitOutcome::Rejected(RejectReason::NoLanguage);
            };
            if !convo.begin_exchange() {
                return SubmitOutcome::Rejected(RejectReason::ReplyInFlight);
            }
            language
        };

        let result = self.reply.greet(language.as_str()).await;

        let mut convo = self.conversation.lock().unwrap();
        convo.finish_exchange();
        match result {
            Ok(greeting) => {
                convo.append_turn(Speaker::Bot, greeting.as_str());
                SubmitOutcome::Replied(greeting)
            }
            Err(e) => {
                log::warn!("session {}: greeting failed: {e}", convo.id());
                SubmitOutcome::Unanswered(e)
            }
        }
    }

    pub fn start_recording(&self) -> Result<(), AudioCaptureError> {
        self.capture
            .lock()
            .unwrap()
            .start()
            .inspect_err(|e| log::warn!("could not start recording: {e}"))
    }

    /// Stop the recording, drain it, transcribe, and route the recognized
    /// text through the same submit path as typed input.
    pub async fn finish_recording(&self) -> VoiceOutcome {
        let drained = {
            let mut capture = self.capture.lock().unwrap();
            if let Err(e) = capture.stop() {
                log::warn!("could not stop recording: {e}");
                return VoiceOutcome::CaptureFailed(e);
            }
            match capture.drain() {
                Ok(drained) => drained,
                Err(e) => {
                    log::warn!("could not drain recording: {e}");
                    return VoiceOutcome::CaptureFailed(e);
                }
            }
        };

        self.handle_drained(drained).await
    }

    async fn handle_drained(&self, drained: Option<EncodedSpeech>) -> VoiceOutcome {
        let Some(speech) = drained else {
            log::warn!("no speech found");
            return VoiceOutcome::NoSpeech;
        };

        let language = self.conversation.lock().unwrap().language();
        let Some(language) = language else {
            log::warn!("rejected voice submit: no language chosen");
            return VoiceOutcome::Rejected(RejectReason::NoLanguage);
        };

        match self.transcription.transcribe(&speech, language.as_str()).await {
            Ok(transcript) => {
                let outcome = self.submit(&transcript).await;
                VoiceOutcome::Submitted {
                    transcript,
                    outcome,
                }
            }
            Err(e) => {
                log::warn!("transcription failed: {e}");
                VoiceOutcome::TranscriptionFailed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::ReplyRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedReply {
        calls: AtomicUsize,
        script: Result<&'static str, u16>,
        delay: Duration,
    }

    impl ScriptedReply {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Ok(reply),
                delay: Duration::ZERO,
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Err(status),
                delay: Duration::ZERO,
            })
        }

        fn slow(reply: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Ok(reply),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn respond(&self) -> Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.script {
                Ok(reply) => Ok(reply.to_string()),
                Err(status) => Err(RemoteError::Backend {
                    status,
                    message: "scripted failure".into(),
                }),
            }
        }
    }

    #[async_trait]
    impl ReplyProvider for ScriptedReply {
        async fn reply(&self, _request: &ReplyRequest) -> Result<String, RemoteError> {
            self.respond().await
        }

        async fn greet(&self, _language: &str) -> Result<String, RemoteError> {
            self.respond().await
        }
    }

    struct ScriptedTranscription(&'static str);

    #[async_trait]
    impl TranscriptionProvider for ScriptedTranscription {
        async fn transcribe(
            &self,
            _speech: &EncodedSpeech,
            _language: &str,
        ) -> Result<String, RemoteError> {
            Ok(self.0.to_string())
        }
    }

    struct PanickingTranscription;

    #[async_trait]
    impl TranscriptionProvider for PanickingTranscription {
        async fn transcribe(
            &self,
            _speech: &EncodedSpeech,
            _language: &str,
        ) -> Result<String, RemoteError> {
            panic!("transcription must not be invoked");
        }
    }

    fn controller(reply: Arc<ScriptedReply>) -> SessionController {
        SessionController::new(reply, Arc::new(PanickingTranscription))
    }

    #[tokio::test]
    async fn submit_without_language_touches_nothing() {
        let reply = ScriptedReply::ok("Hi there");
        let controller = controller(reply.clone());

        let outcome = controller.submit("Hello").await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::NoLanguage)
        ));
        assert!(controller.transcript().is_empty());
        assert_eq!(reply.calls(), 0);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_the_gate() {
        let reply = ScriptedReply::ok("Hi there");
        let controller = controller(reply.clone());
        controller.set_language("English");

        let outcome = controller.submit("   ").await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::EmptyInput)
        ));
        assert!(controller.transcript().is_empty());
        assert!(controller.chat_enabled());
        assert_eq!(reply.calls(), 0);
    }

    #[tokio::test]
    async fn successful_submit_appends_both_turns() {
        let controller = controller(ScriptedReply::ok("Hi there"));
        controller.set_language("English");
        controller.set_pending_input("Hello");

        let outcome = controller.submit("Hello").await;
        assert!(matches!(outcome, SubmitOutcome::Replied(ref r) if r == "Hi there"));
        assert_eq!(
            controller.transcript(),
            vec![Turn::user("Hello"), Turn::bot("Hi there")]
        );
        assert_eq!(controller.user_texts(), vec!["Hello"]);
        assert_eq!(controller.bot_texts(), vec!["Hi there"]);
        assert_eq!(controller.pending_input(), "");
        assert!(!controller.awaiting_reply());
    }

    #[tokio::test]
    async fn failed_submit_keeps_the_user_turn() {
        let controller = controller(ScriptedReply::failing(500));
        controller.set_language("English");
        controller.set_pending_input("Hello");

        let outcome = controller.submit("Hello").await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Unanswered(RemoteError::Backend { status: 500, .. })
        ));
        assert_eq!(controller.transcript(), vec![Turn::user("Hello")]);
        // Not a completed exchange.
        assert!(controller.user_texts().is_empty());
        assert!(controller.bot_texts().is_empty());
        // The pending input was never confirmed sent, so it stays.
        assert_eq!(controller.pending_input(), "Hello");
        assert!(!controller.awaiting_reply());
        assert!(controller.chat_enabled(), "session stays usable");
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let reply = ScriptedReply::slow("Hi there", Duration::from_millis(50));
        let controller = controller(reply.clone());
        controller.set_language("English");

        let second = controller.clone();
        let (first, second) = tokio::join!(controller.submit("one"), second.submit("two"));

        assert!(matches!(first, SubmitOutcome::Replied(_)));
        assert!(matches!(
            second,
            SubmitOutcome::Rejected(RejectReason::ReplyInFlight)
        ));
        assert_eq!(reply.calls(), 1);
        assert_eq!(
            controller.transcript(),
            vec![Turn::user("one"), Turn::bot("Hi there")]
        );
    }

    #[tokio::test]
    async fn voice_input_follows_the_typed_path() {
        let reply = ScriptedReply::ok("Playing it now");
        let controller = SessionController::new(
            reply.clone(),
            Arc::new(ScriptedTranscription("play music")),
        );
        controller.set_language("English");

        let speech = EncodedSpeech {
            base64: "UklGRg==".into(),
            sample_rate_hz: 16_000,
        };
        let outcome = controller.handle_drained(Some(speech)).await;
        match outcome {
            VoiceOutcome::Submitted {
                transcript,
                outcome: SubmitOutcome::Replied(reply),
            } => {
                assert_eq!(transcript, "play music");
                assert_eq!(reply, "Playing it now");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // Identical transcript shape to a typed submit of the same text.
        assert_eq!(
            controller.transcript(),
            vec![Turn::user("play music"), Turn::bot("Playing it now")]
        );
    }

    #[tokio::test]
    async fn empty_drain_never_reaches_transcription() {
        let controller = controller(ScriptedReply::ok("unused"));
        controller.set_language("English");

        let outcome = controller.handle_drained(None).await;
        assert!(matches!(outcome, VoiceOutcome::NoSpeech));
        assert!(controller.transcript().is_empty());
    }

    #[tokio::test]
    async fn finish_without_start_is_a_capture_failure() {
        let controller = controller(ScriptedReply::ok("unused"));
        controller.set_language("English");

        let outcome = controller.finish_recording().await;
        assert!(matches!(
            outcome,
            VoiceOutcome::CaptureFailed(AudioCaptureError::NotRecording)
        ));
        assert!(controller.transcript().is_empty());
        assert!(controller.chat_enabled(), "session stays usable");
    }

    #[tokio::test]
    async fn greeting_appends_a_lone_bot_turn() {
        let controller = controller(ScriptedReply::ok("Hallo! Wie heißt du?"));
        controller.set_language("Deutsch");

        let outcome = controller.greet().await;
        assert!(matches!(outcome, SubmitOutcome::Replied(_)));
        assert_eq!(
            controller.transcript(),
            vec![Turn::bot("Hallo! Wie heißt du?")]
        );
        assert!(controller.user_texts().is_empty());
        assert!(controller.bot_texts().is_empty());
    }

    #[tokio::test]
    async fn greeting_requires_a_language() {
        let reply = ScriptedReply::ok("unused");
        let controller = controller(reply.clone());

        let outcome = controller.greet().await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::NoLanguage)
        ));
        assert_eq!(reply.calls(), 0);
    }
}
