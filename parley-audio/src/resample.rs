use anyhow::Context;
use rubato::Resampler;

/// Rate the speech payload is uploaded at. Whisper-family backends are
/// trained on 16kHz mono; anything higher only inflates the payload.
pub const SPEECH_SAMPLE_RATE_HZ: u32 = 16_000;

/// Downsample mono f32 PCM in [-1, 1] to the speech upload rate.
pub fn downsample_for_speech(samples: &[f32], input_rate_hz: u32) -> anyhow::Result<Vec<f32>> {
    if input_rate_hz == SPEECH_SAMPLE_RATE_HZ || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let params = rubato::SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: rubato::SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: rubato::WindowFunction::Blackman,
    };

    let mut resampler = rubato::SincFixedIn::<f32>::new(
        SPEECH_SAMPLE_RATE_HZ as f64 / input_rate_hz as f64,
        2.0,
        params,
        samples.len(),
        1,
    )
    .context("create resampler")?;

    let output = resampler
        .process(&[samples.to_vec()], None)
        .context("resample")?;
    Ok(output.into_iter().next().unwrap_or_default())
}
