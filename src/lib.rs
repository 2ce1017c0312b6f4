pub mod dsp;
pub mod engine; // Lazy audio output bootstrap and shared output stage
pub mod notes; // Note identifiers and the frequency table
pub mod synth; // Voice lifecycle management

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
