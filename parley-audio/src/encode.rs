use std::io::Cursor;

use base64::Engine;

/// A drained recording, ready for transport: base64 of a 16-bit mono WAV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSpeech {
    pub base64: String,
    pub sample_rate_hz: u32,
}

/// Encode mono f32 PCM as an in-memory 16-bit WAV, then base64.
pub fn wav_base64(samples: &[f32], sample_rate_hz: u32) -> Result<String, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    Ok(base64::engine::general_purpose::STANDARD.encode(cursor.into_inner()))
}
