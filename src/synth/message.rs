use crate::notes::Note;

/// Visual-feedback notifications pushed by the [`VoiceManager`] as keys go
/// down and up. The UI drains these from the other end of an SPSC queue and
/// toggles key highlighting; the manager never blocks on a full queue.
///
/// [`VoiceManager`]: crate::synth::VoiceManager
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    /// A new voice started sounding for this note.
    Pressed(Note),
    /// The note was logically released (its tail may still be audible).
    Released(Note),
}
