use serde::Serialize;

use crate::language::Language;
use crate::types::{SessionId, Speaker, Turn};

/// Payload for one chat-completion round trip: the completed history so far,
/// with the new user text as a separate field. Built fresh per call, never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRequest {
    pub language: String,
    pub past_user_inputs: Vec<String>,
    pub past_bot_replies: Vec<String>,
    pub text: String,
}

/// One conversation session: the ordered transcript, the chosen language,
/// and the gates the view layer reads.
///
/// The transcript is append-only; existing turns are never edited or
/// reordered. The per-speaker histories the chat backend expects are pure
/// projections of the transcript (see [`Conversation::completed_exchanges`]),
/// so they cannot drift out of sync with it.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: SessionId,
    language: Option<Language>,
    pending_input: String,
    in_flight: bool,
    transcript: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            language: None,
            pending_input: String::new(),
            in_flight: false,
            transcript: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Choose the session language. The first valid choice wins; a second
    /// call or an off-list tag is logged and leaves the state unchanged.
    pub fn set_language(&mut self, tag: &str) {
        if self.language.is_some() {
            log::warn!("session {}: language already chosen, ignoring {tag:?}", self.id);
            return;
        }
        match Language::parse(tag) {
            Some(language) => {
                log::info!("session {}: language set to {language}", self.id);
                self.language = Some(language);
            }
            None => log::warn!("session {}: unsupported language {tag:?}", self.id),
        }
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub fn clear_pending_input(&mut self) {
        self.pending_input.clear();
    }

    /// The only way the transcript grows. O(1) amortized.
    pub fn append_turn(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(Turn {
            speaker,
            text: text.into(),
        });
    }

    /// Whether the input surface should accept a submit: a language has been
    /// chosen and no remote call is in flight.
    pub fn chat_enabled(&self) -> bool {
        self.language.is_some() && !self.in_flight
    }

    /// Explicit "bot is typing" signal. A trailing unanswered User turn
    /// while this is false is a failed exchange, not a pending one.
    pub fn awaiting_reply(&self) -> bool {
        self.in_flight
    }

    /// Take the in-flight gate for one exchange. Returns false (and changes
    /// nothing) when chat is disabled; the check and the set are a single
    /// step so a second submit cannot slip in between them.
    pub fn begin_exchange(&mut self) -> bool {
        if !self.chat_enabled() {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish_exchange(&mut self) {
        self.in_flight = false;
    }

    /// Pairs each User turn with the Bot turn that answered it, in order.
    /// Unanswered User turns and unpaired Bot turns (the opening greeting)
    /// are excluded, so a failed exchange never enters the history.
    pub fn completed_exchanges(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        let mut pending_user: Option<&str> = None;
        for turn in &self.transcript {
            match turn.speaker {
                Speaker::User => pending_user = Some(turn.text.as_str()),
                Speaker::Bot => {
                    if let Some(user) = pending_user.take() {
                        pairs.push((user, turn.text.as_str()));
                    }
                }
            }
        }
        pairs
    }

    pub fn user_texts(&self) -> Vec<String> {
        self.completed_exchanges()
            .into_iter()
            .map(|(user, _)| user.to_string())
            .collect()
    }

    pub fn bot_texts(&self) -> Vec<String> {
        self.completed_exchanges()
            .into_iter()
            .map(|(_, bot)| bot.to_string())
            .collect()
    }

    /// Build the request payload for a new user turn. `None` until a
    /// language has been chosen.
    pub fn reply_request(&self, text: &str) -> Option<ReplyRequest> {
        let language = self.language?;
        let mut past_user_inputs = Vec::new();
        let mut past_bot_replies = Vec::new();
        for (user, bot) in self.completed_exchanges() {
            past_user_inputs.push(user.to_string());
            past_bot_replies.push(bot.to_string());
        }
        Some(ReplyRequest {
            language: language.as_str().to_string(),
            past_user_inputs,
            past_bot_replies,
            text: text.to_string(),
        })
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
