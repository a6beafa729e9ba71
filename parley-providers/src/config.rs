//! Backend configuration, injected from the environment.
//!
//! Nothing here is hard-coded at call sites: the builders in
//! [`crate::chat`] and [`crate::transcription`] take these structs, and
//! `from_env` is the only place the variable names appear.

use std::time::Duration;

pub const ENV_CHAT_ENDPOINT: &str = "PARLEY_CHAT_ENDPOINT";
pub const ENV_CHAT_API_KEY: &str = "PARLEY_CHAT_API_KEY";
pub const ENV_CHAT_MODEL: &str = "PARLEY_CHAT_MODEL";
pub const ENV_CHAT_TEMPERATURE: &str = "PARLEY_CHAT_TEMPERATURE";
pub const ENV_CHAT_MAX_TOKENS: &str = "PARLEY_CHAT_MAX_TOKENS";
pub const ENV_CHAT_TOP_P: &str = "PARLEY_CHAT_TOP_P";
pub const ENV_CHAT_FREQUENCY_PENALTY: &str = "PARLEY_CHAT_FREQUENCY_PENALTY";
pub const ENV_CHAT_PRESENCE_PENALTY: &str = "PARLEY_CHAT_PRESENCE_PENALTY";
pub const ENV_CHAT_TIMEOUT_SECS: &str = "PARLEY_CHAT_TIMEOUT_SECS";

pub const ENV_STT_ENDPOINT: &str = "PARLEY_STT_ENDPOINT";
pub const ENV_STT_API_KEY: &str = "PARLEY_STT_API_KEY";
pub const ENV_STT_MODEL: &str = "PARLEY_STT_MODEL";
pub const ENV_STT_TIMEOUT_SECS: &str = "PARLEY_STT_TIMEOUT_SECS";

/// Chat-completion backend: endpoint, model, sampling knobs, credential.
#[derive(Clone, PartialEq)]
pub struct ChatBackendConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub timeout_secs: u64,
}

impl ChatBackendConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_or(ENV_CHAT_ENDPOINT, "https://api.openai.com/v1"),
            api_key: env_or(ENV_CHAT_API_KEY, ""),
            model: env_or(ENV_CHAT_MODEL, "gpt-4o-mini"),
            temperature: env_parse_or(ENV_CHAT_TEMPERATURE, 0.7),
            max_tokens: env_parse_or(ENV_CHAT_MAX_TOKENS, 256),
            top_p: env_parse_or(ENV_CHAT_TOP_P, 1.0),
            frequency_penalty: env_parse_or(ENV_CHAT_FREQUENCY_PENALTY, 0.0),
            presence_penalty: env_parse_or(ENV_CHAT_PRESENCE_PENALTY, 0.0),
            timeout_secs: env_parse_or(ENV_CHAT_TIMEOUT_SECS, 30),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for ChatBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBackendConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("presence_penalty", &self.presence_penalty)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Transcription backend: a hosted speech-to-text model addressed as
/// `{endpoint}/{model}`.
#[derive(Clone, PartialEq, Eq)]
pub struct TranscriptionBackendConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl TranscriptionBackendConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_or(
                ENV_STT_ENDPOINT,
                "https://api-inference.huggingface.co/models",
            ),
            api_key: env_or(ENV_STT_API_KEY, ""),
            model: env_or(ENV_STT_MODEL, "openai/whisper-tiny"),
            timeout_secs: env_parse_or(ENV_STT_TIMEOUT_SECS, 9),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for TranscriptionBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionBackendConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    parse_or(name, std::env::var(name).ok(), default)
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("ignoring {name}={raw:?}: {e}");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("X", Some("not-a-number".into()), 30u64), 30);
        assert_eq!(parse_or("X", None, 30u64), 30);
        assert_eq!(parse_or("X", Some(" 12 ".into()), 30u64), 12);
        assert_eq!(parse_or("X", Some("0.3".into()), 0.7f32), 0.3);
    }

    #[test]
    fn debug_never_shows_the_credential() {
        let cfg = ChatBackendConfig {
            endpoint: "https://api.example.com/v1".into(),
            api_key: "sk-secret".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 256,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_secs: 30,
        };
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("[REDACTED]"));

        let stt = TranscriptionBackendConfig {
            endpoint: "https://stt.example.com".into(),
            api_key: "hf-secret".into(),
            model: "openai/whisper-tiny".into(),
            timeout_secs: 9,
        };
        let shown = format!("{stt:?}");
        assert!(!shown.contains("hf-secret"));
        assert!(shown.contains("[REDACTED]"));
    }
}
