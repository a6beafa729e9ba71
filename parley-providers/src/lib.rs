pub mod chat;
pub mod config;
pub mod error;
pub mod parse;
pub mod request;
pub mod runtime;
pub mod transcription;

pub use config::{ChatBackendConfig, TranscriptionBackendConfig};
pub use error::RemoteError;
pub use request::{Body, HttpRequest};
