pub mod capture;
pub mod encode;
pub mod resample;

pub use capture::{AudioCapture, AudioCaptureError, CaptureState};
pub use encode::EncodedSpeech;
