use thiserror::Error;

/// Failure taxonomy for the two remote boundaries.
///
/// The validation variants are produced locally, before any network
/// dispatch; the rest classify what the network or the backend did.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("unsupported language: {0:?}")]
    UnsupportedLanguage(String),

    #[error("invalid audio payload: {0}")]
    InvalidPayload(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("backend returned an empty reply")]
    EmptyReply,

    #[error("failed to decode backend response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// True for failures rejected locally, without a network round trip.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RemoteError::UnsupportedLanguage(_) | RemoteError::InvalidPayload(_)
        )
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_variants_are_local() {
        assert!(RemoteError::UnsupportedLanguage("Klingon".into()).is_validation());
        assert!(RemoteError::InvalidPayload("bad base64".into()).is_validation());
        assert!(!RemoteError::Timeout.is_validation());
        assert!(
            !RemoteError::Backend {
                status: 500,
                message: "boom".into()
            }
            .is_validation()
        );
    }

    #[test]
    fn backend_error_carries_status_and_message() {
        let e = RemoteError::Backend {
            status: 503,
            message: "overloaded".into(),
        };
        let shown = e.to_string();
        assert!(shown.contains("503"));
        assert!(shown.contains("overloaded"));
    }
}
