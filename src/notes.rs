/*
Note Identifiers
================

The keyboard spans 32 chromatic pitches, C4 (middle C) up to G6. Each pitch
is a `Note` variant carrying nothing but its identity; the frequency table
below maps every variant to its equal-temperament fundamental (A4 = 440 Hz
reference).

Naming Convention:
- Natural notes: C4, D4, E4, ...
- Sharps: Cs4 (C#4), Ds4 (D#4), ...

Unknown identifier strings parse to `None`. Callers treat that as a no-op
signal, never an error: pressing a key outside the table simply does nothing.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Note {
    C4, Cs4, D4, Ds4, E4, F4, Fs4, G4, Gs4, A4, As4, B4,
    C5, Cs5, D5, Ds5, E5, F5, Fs5, G5, Gs5, A5, As5, B5,
    C6, Cs6, D6, Ds6, E6, F6, Fs6, G6,
}

use Note::*;

impl Note {
    /// All 32 notes in ascending pitch order.
    pub const ALL: [Note; 32] = [
        C4, Cs4, D4, Ds4, E4, F4, Fs4, G4, Gs4, A4, As4, B4,
        C5, Cs5, D5, Ds5, E5, F5, Fs5, G5, Gs5, A5, As5, B5,
        C6, Cs6, D6, Ds6, E6, F6, Fs6, G6,
    ];

    /// Parse a note identifier token ("C4", "Cs5"). Unknown tokens return
    /// `None` and must be treated as a no-op by callers.
    pub fn from_name(name: &str) -> Option<Note> {
        Note::ALL.iter().copied().find(|n| n.name() == name)
    }

    /// The canonical identifier token, inverse of [`Note::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            C4 => "C4", Cs4 => "Cs4", D4 => "D4", Ds4 => "Ds4", E4 => "E4", F4 => "F4",
            Fs4 => "Fs4", G4 => "G4", Gs4 => "Gs4", A4 => "A4", As4 => "As4", B4 => "B4",
            C5 => "C5", Cs5 => "Cs5", D5 => "D5", Ds5 => "Ds5", E5 => "E5", F5 => "F5",
            Fs5 => "Fs5", G5 => "G5", Gs5 => "Gs5", A5 => "A5", As5 => "As5", B5 => "B5",
            C6 => "C6", Cs6 => "Cs6", D6 => "D6", Ds6 => "Ds6", E6 => "E6", F6 => "F6",
            Fs6 => "Fs6", G6 => "G6",
        }
    }

    /// Fundamental frequency in Hz. Total over the note set.
    pub fn frequency(self) -> f32 {
        match self {
            C4 => 261.63, Cs4 => 277.18, D4 => 293.66, Ds4 => 311.13, E4 => 329.63,
            F4 => 349.23, Fs4 => 369.99, G4 => 392.00, Gs4 => 415.30, A4 => 440.00,
            As4 => 466.16, B4 => 493.88,
            C5 => 523.25, Cs5 => 554.37, D5 => 587.33, Ds5 => 622.25, E5 => 659.25,
            F5 => 698.46, Fs5 => 739.99, G5 => 783.99, Gs5 => 830.61, A5 => 880.00,
            As5 => 932.33, B5 => 987.77,
            C6 => 1046.50, Cs6 => 1108.73, D6 => 1174.66, Ds6 => 1244.51, E6 => 1318.51,
            F6 => 1396.91, Fs6 => 1479.98, G6 => 1567.98,
        }
    }

    /// Black keys on the drawn keyboard.
    pub fn is_sharp(self) -> bool {
        self.name().as_bytes()[1] == b's'
    }
}
