//! Lazy audio output bootstrap.
//!
//! [`AudioEngine`] is the session-wide handle over the platform audio
//! context: the cpal output stream plus the shared [`Compressor`] output
//! stage every voice renders into. Nothing is constructed until
//! [`AudioEngine::ensure_ready`] runs on the first real key press, and the
//! call is idempotent, so the input path can (and should) call it before
//! every note-on. Calling it again on a built engine re-issues
//! `stream.play()`, which un-suspends a stream the platform has paused.
//!
//! Construction failure is not fatal to the application: the error is
//! reported once, then the engine latches into degraded mode where every
//! call is a cheap no-op. Key handling and visual feedback keep working,
//! there is just no sound for the rest of the session.

use std::fmt;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{dsp::compressor::Compressor, synth::VoiceManager, MAX_BLOCK_SIZE};

/// Timebase used when no output device can tell us better.
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

#[derive(Debug)]
pub enum EngineError {
    NoOutputDevice,
    Config(cpal::DefaultStreamConfigError),
    Build(cpal::BuildStreamError),
    Play(cpal::PlayStreamError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoOutputDevice => write!(f, "no default audio output device available"),
            EngineError::Config(e) => write!(f, "failed to fetch default output config: {e}"),
            EngineError::Build(e) => write!(f, "failed to build output stream: {e}"),
            EngineError::Play(e) => write!(f, "failed to start output stream: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<cpal::DefaultStreamConfigError> for EngineError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<cpal::BuildStreamError> for EngineError {
    fn from(e: cpal::BuildStreamError) -> Self {
        EngineError::Build(e)
    }
}

impl From<cpal::PlayStreamError> for EngineError {
    fn from(e: cpal::PlayStreamError) -> Self {
        EngineError::Play(e)
    }
}

enum EngineState {
    /// No context yet; the first `ensure_ready` will build one.
    Idle,
    /// Stream built and (as far as we know) running.
    Running(cpal::Stream),
    /// Construction failed once; audio is inert for the session.
    Failed,
}

pub struct AudioEngine {
    manager: Arc<Mutex<VoiceManager>>,
    sample_rate: f32,
    state: EngineState,
}

impl AudioEngine {
    /// Ask the default output device for its sample rate so the voice
    /// manager can be created with a coherent timebase before the stream
    /// exists. Falls back to [`DEFAULT_SAMPLE_RATE`] when there is no
    /// usable device (the engine will latch degraded later anyway).
    pub fn probe_sample_rate() -> f32 {
        cpal::default_host()
            .default_output_device()
            .and_then(|d| d.default_output_config().ok())
            .map(|c| c.sample_rate().0 as f32)
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn new(manager: Arc<Mutex<VoiceManager>>, sample_rate: f32) -> Self {
        Self {
            manager,
            sample_rate,
            state: EngineState::Idle,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// True once a stream has been built and not abandoned.
    pub fn is_available(&self) -> bool {
        matches!(self.state, EngineState::Running(_))
    }

    /// Build the output stream if it does not exist yet, or nudge an
    /// existing one back into playback. Idempotent; safe before every
    /// note-on.
    ///
    /// Any failure, at construction or during a later resume, is returned
    /// exactly once. After that the engine is permanently degraded and this
    /// becomes a no-op.
    pub fn ensure_ready(&mut self) -> Result<(), EngineError> {
        match std::mem::replace(&mut self.state, EngineState::Idle) {
            EngineState::Failed => {
                self.state = EngineState::Failed;
                Ok(())
            }
            // Resume-on-suspend: platforms may pause the stream behind our
            // back; play() on a playing stream is harmless.
            EngineState::Running(stream) => match stream.play() {
                Ok(()) => {
                    self.state = EngineState::Running(stream);
                    Ok(())
                }
                Err(e) => {
                    // Dropping the stream here tears it down with the state.
                    self.state = EngineState::Failed;
                    Err(EngineError::from(e))
                }
            },
            EngineState::Idle => match self.build_stream() {
                Ok(stream) => {
                    self.state = EngineState::Running(stream);
                    Ok(())
                }
                Err(e) => {
                    self.state = EngineState::Failed;
                    Err(e)
                }
            },
        }
    }

    fn build_stream(&mut self) -> Result<cpal::Stream, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        self.sample_rate = sample_rate;

        let manager = Arc::clone(&self.manager);
        let mut compressor = Compressor::new(sample_rate);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let mut manager = match manager.lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        data.fill(0.0);
                        return;
                    }
                };

                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                    let block = &mut render_buf[..frames_to_render];
                    block.fill(0.0);
                    manager.render_block(block);
                    compressor.process(block);

                    // Mono render fanned out to all channels
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames_to_render;
                }
            },
            |err| eprintln!("audio stream error: {err}"),
            None,
        )?;

        stream.play()?;
        Ok(stream)
    }
}
