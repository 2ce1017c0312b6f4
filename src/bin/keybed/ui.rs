//! On-screen keyboard rendering and hit-testing.
//!
//! The keyboard is drawn as two tiers: white keys fill the full height,
//! black keys overlay the upper band straddling the boundary between their
//! neighbours. Highlighting is driven entirely by [`KeyEvent`] feedback from
//! the voice manager, so a key lights up exactly while its note has an
//! active voice, no matter whether it was played by terminal key or mouse.

use std::collections::HashSet;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
};

use keybed::{notes::Note, synth::KeyEvent};

/// Columns per white key.
const WHITE_KEY_WIDTH: u16 = 4;
/// Rows of the keyboard block.
const KEYBOARD_HEIGHT: u16 = 8;
/// Rows of the upper band that black keys overlay.
const BLACK_KEY_HEIGHT: u16 = 4;

pub struct Keyboard {
    lit: HashSet<Note>,
    /// Keyboard rect from the last render, for mouse hit-testing.
    area: Rect,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            lit: HashSet::new(),
            area: Rect::default(),
        }
    }

    /// Track press/release feedback from the voice manager.
    pub fn apply(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Pressed(note) => {
                self.lit.insert(note);
            }
            KeyEvent::Released(note) => {
                self.lit.remove(&note);
            }
        }
    }

    fn white_notes() -> impl Iterator<Item = Note> {
        Note::ALL.into_iter().filter(|n| !n.is_sharp())
    }

    /// The sharp directly above a white note, if the keyboard has it.
    fn sharp_after(white: Note) -> Option<Note> {
        let idx = Note::ALL.iter().position(|&n| n == white)?;
        match Note::ALL.get(idx + 1) {
            Some(&next) if next.is_sharp() => Some(next),
            _ => None,
        }
    }

    pub fn render(&mut self, buf: &mut Buffer, area: Rect) {
        let white_count = Self::white_notes().count() as u16;
        let kb_width = white_count * WHITE_KEY_WIDTH;
        let kb_height = KEYBOARD_HEIGHT.min(area.height);

        let x0 = area.x + area.width.saturating_sub(kb_width) / 2;
        let y0 = area.y;
        self.area = Rect::new(x0, y0, kb_width.min(area.width), kb_height);
        if kb_height == 0 {
            return;
        }

        // White keys first, full height, with the note name on the bottom row
        for (i, note) in Self::white_notes().enumerate() {
            let x = x0 + i as u16 * WHITE_KEY_WIDTH;
            if x + WHITE_KEY_WIDTH > area.x + area.width {
                break;
            }

            let bg = if self.lit.contains(&note) {
                Color::Yellow
            } else {
                Color::White
            };
            let style = Style::default().bg(bg).fg(Color::Black);

            for row in 0..kb_height {
                buf.set_string(x, y0 + row, "   ", style);
            }
            buf.set_string(x, y0 + kb_height.saturating_sub(1), note.name(), style);
        }

        // Black keys overlay the upper band, straddling the key boundary
        for (i, white) in Self::white_notes().enumerate() {
            let Some(sharp) = Self::sharp_after(white) else {
                continue;
            };

            let x = x0 + i as u16 * WHITE_KEY_WIDTH + WHITE_KEY_WIDTH - 1;
            if x + 2 > area.x + area.width {
                break;
            }

            let bg = if self.lit.contains(&sharp) {
                Color::Yellow
            } else {
                Color::Black
            };
            let style = Style::default().bg(bg).fg(Color::White);

            for row in 0..BLACK_KEY_HEIGHT.min(kb_height) {
                buf.set_string(x, y0 + row, "  ", style);
            }
        }
    }

    /// Map a terminal cell to the key drawn there. Black keys win in the
    /// upper band, mirroring how the keys are painted.
    pub fn hit(&self, column: u16, row: u16) -> Option<Note> {
        let kb = self.area;
        if kb.width == 0
            || column < kb.x
            || column >= kb.x + kb.width
            || row < kb.y
            || row >= kb.y + kb.height
        {
            return None;
        }

        let rel_x = column - kb.x;
        let white_idx = (rel_x / WHITE_KEY_WIDTH) as usize;

        if row < kb.y + BLACK_KEY_HEIGHT {
            // Within a black key's two columns? It straddles the boundary
            // after its white neighbour.
            for (i, white) in Self::white_notes().enumerate() {
                if Self::sharp_after(white).is_none() {
                    continue;
                }
                let bx = i as u16 * WHITE_KEY_WIDTH + WHITE_KEY_WIDTH - 1;
                if rel_x == bx || rel_x == bx + 1 {
                    return Self::sharp_after(white);
                }
            }
        }

        Self::white_notes().nth(white_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered_keyboard() -> Keyboard {
        let mut kb = Keyboard::new();
        let area = Rect::new(0, 0, 100, 10);
        let mut buf = Buffer::empty(area);
        kb.render(&mut buf, area);
        kb
    }

    #[test]
    fn nineteen_white_keys() {
        assert_eq!(Keyboard::white_notes().count(), 19);
    }

    #[test]
    fn sharp_lookup() {
        assert_eq!(Keyboard::sharp_after(Note::C4), Some(Note::Cs4));
        assert_eq!(Keyboard::sharp_after(Note::E4), None); // no E#
        assert_eq!(Keyboard::sharp_after(Note::G6), None); // top of range
    }

    #[test]
    fn white_key_hit() {
        let kb = rendered_keyboard();
        // Keyboard is 76 wide, centered in 100 → starts at x=12.
        // Bottom row of the first key is C4.
        let note = kb.hit(12, 7);
        assert_eq!(note, Some(Note::C4));
    }

    #[test]
    fn black_key_hit_in_upper_band() {
        let kb = rendered_keyboard();
        // Columns 15-16 in the upper band straddle C4/D4: that's Cs4
        assert_eq!(kb.hit(12 + 3, 1), Some(Note::Cs4));
        // Same column in the lower band is a white key
        assert_eq!(kb.hit(12 + 3, 6), Some(Note::C4));
    }

    #[test]
    fn outside_the_keyboard_misses() {
        let kb = rendered_keyboard();
        assert_eq!(kb.hit(0, 0), None);
        assert_eq!(kb.hit(99, 20), None);
    }

    #[test]
    fn feedback_toggles_highlight() {
        let mut kb = Keyboard::new();
        kb.apply(KeyEvent::Pressed(Note::A4));
        assert!(kb.lit.contains(&Note::A4));
        kb.apply(KeyEvent::Released(Note::A4));
        assert!(!kb.lit.contains(&Note::A4));
    }
}
