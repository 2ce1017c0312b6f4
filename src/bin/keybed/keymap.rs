//! Physical-key → note binding.
//!
//! Two rows of the keyboard cover a bit over two octaves each, overlapping
//! at C5 so two hands can meet in the middle: the z-row plays octave 4 up
//! into E5, the q-row plays C5 up to G6. Pure configuration data; the note
//! names are resolved by the voice manager, which ignores anything it does
//! not know.

/// (key character, note identifier)
const KEY_TABLE: &[(char, &str)] = &[
    // Bottom row: C4 .. E5
    ('z', "C4"), ('s', "Cs4"), ('x', "D4"), ('d', "Ds4"), ('c', "E4"), ('v', "F4"),
    ('g', "Fs4"), ('b', "G4"), ('h', "Gs4"), ('n', "A4"), ('j', "As4"), ('m', "B4"),
    (',', "C5"), ('l', "Cs5"), ('.', "D5"), (';', "Ds5"), ('/', "E5"),
    // Top row: C5 .. G6
    ('q', "C5"), ('2', "Cs5"), ('w', "D5"), ('3', "Ds5"), ('e', "E5"), ('r', "F5"),
    ('5', "Fs5"), ('t', "G5"), ('6', "Gs5"), ('y', "A5"), ('7', "As5"), ('u', "B5"),
    ('i', "C6"), ('9', "Cs6"), ('o', "D6"), ('0', "Ds6"), ('p', "E6"),
    ('[', "F6"), ('=', "Fs6"), (']', "G6"),
];

pub fn note_for_key(key: char) -> Option<&'static str> {
    KEY_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybed::notes::Note;

    #[test]
    fn every_mapped_name_is_a_known_note() {
        for (key, name) in KEY_TABLE {
            assert!(
                Note::from_name(name).is_some(),
                "key '{key}' maps to unknown note {name}"
            );
        }
    }

    #[test]
    fn unmapped_keys_yield_nothing() {
        assert_eq!(note_for_key('a'), None);
        assert_eq!(note_for_key(' '), None);
        assert_eq!(note_for_key('Z'), None);
    }

    #[test]
    fn rows_overlap_at_c5() {
        assert_eq!(note_for_key(','), Some("C5"));
        assert_eq!(note_for_key('q'), Some("C5"));
    }
}
