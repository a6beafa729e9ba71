pub mod clients;
pub mod controller;
pub mod traits;

pub use clients::{HttpReplyClient, HttpTranscriptionClient};
pub use controller::{RejectReason, SessionController, SubmitOutcome, VoiceOutcome};
pub use traits::{ReplyProvider, TranscriptionProvider};
