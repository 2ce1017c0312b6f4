// Purpose: voice lifecycle management for the keyboard.
// This layer sits above the DSP primitives and owns every sounding voice.

pub mod manager;
pub mod message;
pub mod voice;

pub use manager::VoiceManager;
pub use message::KeyEvent;
