//! Low-level DSP primitives used by the synth voices and output stage.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs and the audio callback. They stay
//! focused on the signal-processing math; voice orchestration lives in
//! [`crate::synth`].

/// Dynamics compressor for the shared output stage.
pub mod compressor;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Oscillator waveforms.
pub mod oscillator;

pub use envelope::EnvelopeState;
