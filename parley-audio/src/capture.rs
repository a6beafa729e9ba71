//! Microphone capture with an explicit per-recording lifecycle.
//!
//! `Idle -> start() -> Recording -> stop() -> Stopped -> drain() -> Idle`
//!
//! The microphone is acquired by `start()` and released by `drain()`, so a
//! capture instance can live as long as its session without pinning the
//! device. `stop()` returns only once the capture worker has handed back the
//! finalized buffer; there is no settling delay for callers to guess at.

use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat, SizedSample, Stream};

use crate::encode::{EncodedSpeech, wav_base64};
use crate::resample::{SPEECH_SAMPLE_RATE_HZ, downsample_for_speech};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(2);
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
pub enum AudioCaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("capture worker failed: {0}")]
    Worker(String),

    #[error("capture worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("stopped recording has not been drained")]
    NotDrained,

    #[error("recording still in progress")]
    StillRecording,

    #[error("failed to resample: {0}")]
    Resample(#[from] anyhow::Error),

    #[error("failed to encode wav: {0}")]
    Encode(#[from] hound::Error),

    #[error("internal channel error")]
    Channel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Stopped,
}

enum WorkerCmd {
    // Reply with everything captured so far and shut down.
    Finish(mpsc::Sender<Vec<f32>>),
}

enum WorkerStartup {
    Ready,
    Error(String),
}

struct Worker {
    cmd_tx: mpsc::Sender<WorkerCmd>,
    handle: std::thread::JoinHandle<()>,
    sample_rate_hz: u32,
}

/// One microphone, one recording at a time.
///
/// Construction is cheap and device-free; the device is only touched by
/// `start()`. All methods take `&mut self`: the state machine is the
/// concurrency story, callers serialize access themselves.
pub struct AudioCapture {
    state: CaptureState,
    worker: Option<Worker>,
    captured: Vec<f32>,
    capture_rate_hz: u32,
}

impl AudioCapture {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            worker: None,
            captured: Vec::new(),
            capture_rate_hz: SPEECH_SAMPLE_RATE_HZ,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Acquire the default input device and start accumulating samples.
    ///
    /// Rejected while a recording is running or an undrained one is pending.
    pub fn start(&mut self) -> Result<(), AudioCaptureError> {
        match self.state {
            CaptureState::Recording => return Err(AudioCaptureError::AlreadyRecording),
            CaptureState::Stopped => return Err(AudioCaptureError::NotDrained),
            CaptureState::Idle => {}
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioCaptureError::NoInputDevice)?;

        // Take the device's default config and downsample later; asking the
        // hardware for 16kHz directly fails on plenty of consumer devices.
        let config = device.default_input_config()?;
        let sample_rate_hz = config.sample_rate().0;

        let (sample_tx, sample_rx) = mpsc::channel::<Vec<f32>>();
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCmd>();
        let (startup_tx, startup_rx) = mpsc::channel::<WorkerStartup>();

        let handle = std::thread::spawn(move || {
            let channels = config.channels() as usize;
            let stream = match build_mono_stream(&device, &config, channels, sample_tx) {
                Ok(s) => s,
                Err(e) => {
                    let _ = startup_tx.send(WorkerStartup::Error(format!("build stream: {e}")));
                    log::error!("input stream build failed: {e}");
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = startup_tx.send(WorkerStartup::Error(format!("play stream: {e}")));
                log::error!("input stream play failed: {e}");
                return;
            }

            let _ = startup_tx.send(WorkerStartup::Ready);
            capture_loop(sample_rx, cmd_rx);
            drop(stream);
        });

        // Block briefly until the stream is running or has failed.
        match startup_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(WorkerStartup::Ready) => {}
            Ok(WorkerStartup::Error(e)) => return Err(AudioCaptureError::Worker(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(AudioCaptureError::WorkerTimeout),
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(AudioCaptureError::Channel),
        }

        log::info!("recording started at {sample_rate_hz}Hz");
        self.worker = Some(Worker {
            cmd_tx,
            handle,
            sample_rate_hz,
        });
        self.state = CaptureState::Recording;
        Ok(())
    }

    /// Stop the recording and finalize its buffer.
    ///
    /// Returns once the worker has flushed every delivered chunk and handed
    /// the buffer back; after `Ok(())` the capture is `Stopped` and the full
    /// recording is ready to drain.
    pub fn stop(&mut self) -> Result<(), AudioCaptureError> {
        if self.state != CaptureState::Recording {
            return Err(AudioCaptureError::NotRecording);
        }
        let worker = self.worker.take().ok_or(AudioCaptureError::Channel)?;

        let (reply_tx, reply_rx) = mpsc::channel();
        if worker.cmd_tx.send(WorkerCmd::Finish(reply_tx)).is_err() {
            // The worker died; nothing left to finalize.
            self.state = CaptureState::Idle;
            return Err(AudioCaptureError::Channel);
        }

        let samples = reply_rx.recv_timeout(STOP_TIMEOUT).map_err(|e| {
            // The worker is stuck or gone; abandon it and stay usable.
            self.state = CaptureState::Idle;
            match e {
                mpsc::RecvTimeoutError::Timeout => AudioCaptureError::StopTimeout,
                mpsc::RecvTimeoutError::Disconnected => AudioCaptureError::Channel,
            }
        })?;
        let _ = worker.handle.join();

        log::info!(
            "recording stopped, {} samples at {}Hz",
            samples.len(),
            worker.sample_rate_hz
        );
        self.captured = samples;
        self.capture_rate_hz = worker.sample_rate_hz;
        self.state = CaptureState::Stopped;
        Ok(())
    }

    /// Encode the finalized buffer for transport and release it.
    ///
    /// `Ok(None)` means no speech was captured: either nothing was recorded
    /// since the last drain (legal on a fresh instance) or the recording was
    /// empty. Only a drain during an active recording is an error.
    pub fn drain(&mut self) -> Result<Option<EncodedSpeech>, AudioCaptureError> {
        match self.state {
            CaptureState::Recording => Err(AudioCaptureError::StillRecording),
            CaptureState::Idle => Ok(None),
            CaptureState::Stopped => {
                let samples = std::mem::take(&mut self.captured);
                let capture_rate_hz = self.capture_rate_hz;
                self.state = CaptureState::Idle;

                if samples.is_empty() {
                    return Ok(None);
                }

                let samples = downsample_for_speech(&samples, capture_rate_hz)?;
                let base64 = wav_base64(&samples, SPEECH_SAMPLE_RATE_HZ)?;
                Ok(Some(EncodedSpeech {
                    base64,
                    sample_rate_hz: SPEECH_SAMPLE_RATE_HZ,
                }))
            }
        }
    }
}

impl Default for AudioCapture {
    fn default() -> Self {
        Self::new()
    }
}

fn build_mono_stream(
    device: &cpal::Device,
    config: &cpal::SupportedStreamConfig,
    channels: usize,
    sample_tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError> {
    let stream_config: cpal::StreamConfig = config.clone().into();
    match config.sample_format() {
        SampleFormat::I16 => input_stream::<i16>(device, &stream_config, channels, sample_tx),
        SampleFormat::U16 => input_stream::<u16>(device, &stream_config, channels, sample_tx),
        SampleFormat::I32 => input_stream::<i32>(device, &stream_config, channels, sample_tx),
        SampleFormat::F64 => input_stream::<f64>(device, &stream_config, channels, sample_tx),
        // F32 is what every mainstream host hands out; treat it as the
        // fallback for exotic formats as well.
        _ => input_stream::<f32>(device, &stream_config, channels, sample_tx),
    }
}

fn input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sample_tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let callback = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let mut chunk = Vec::with_capacity(data.len() / channels.max(1));
        if channels <= 1 {
            chunk.extend(data.iter().map(|&s| s.to_sample::<f32>()));
        } else {
            for frame in data.chunks_exact(channels) {
                let mono =
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32;
                chunk.push(mono);
            }
        }
        let _ = sample_tx.send(chunk);
    };

    device.build_input_stream(
        config,
        callback,
        |err| {
            // Without this, "recording started but silent" is undebuggable.
            log::error!("input stream error: {err}");
        },
        None,
    )
}

fn capture_loop(sample_rx: mpsc::Receiver<Vec<f32>>, cmd_rx: mpsc::Receiver<WorkerCmd>) {
    let mut captured: Vec<f32> = Vec::new();

    loop {
        // Drain commands promptly even if the stream has stalled.
        if let Ok(WorkerCmd::Finish(reply)) = cmd_rx.try_recv() {
            // Flush chunks the stream already delivered before replying, so
            // the handed-back buffer really is the whole recording.
            while let Ok(chunk) = sample_rx.try_recv() {
                captured.extend_from_slice(&chunk);
            }
            let _ = reply.send(std::mem::take(&mut captured));
            return;
        }

        match sample_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(chunk) => captured.extend_from_slice(&chunk),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}
