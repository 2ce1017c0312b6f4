use std::collections::HashMap;

use rtrb::Producer;

use crate::{
    dsp::envelope::EnvelopeShape,
    notes::Note,
    synth::{message::KeyEvent, voice::Voice},
};

/*
Voice Manager
=============

Turns discrete press/release events into overlapping, independently
enveloped voices. The central invariant: AT MOST ONE active voice per note.

Per-note lifecycle:

    (no voice) ──note_on──▶ Sounding ──note_off──▶ Releasing ──tail done──▶ (no voice)
                            in `active`            in `tails`

Only "no voice" and Sounding are externally observable (through the active
set); Releasing voices have already been removed from `active` and live in
the tail list until their release window plus cleanup margin has played
out, in rendered samples or in wall-clock time. A tail cannot be cancelled
once started.

Because logical release is immediate, re-pressing a note during its release
tail starts a fresh, independent voice - the old tail keeps fading
underneath it. Overlapping same-note tails are intentional.

All mutation happens on one logical thread of control: the input side and
the audio callback share the manager behind a mutex, every operation runs
synchronously to completion, and tail reaping only touches voices already
outside the active set.
*/

pub struct VoiceManager {
    sample_rate: f32,
    shape: EnvelopeShape,
    /// The Active Voice Set: note → its one Sounding voice.
    active: HashMap<Note, Voice>,
    /// Released voices still rendering their tails, in release order.
    tails: Vec<Voice>,
    /// Visual-feedback queue to the UI; best-effort, drops when full.
    feedback: Option<Producer<KeyEvent>>,
}

impl VoiceManager {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_shape(sample_rate, EnvelopeShape::keyboard())
    }

    pub fn with_shape(sample_rate: f32, shape: EnvelopeShape) -> Self {
        Self {
            sample_rate,
            shape,
            active: HashMap::new(),
            tails: Vec::new(),
            feedback: None,
        }
    }

    /// Attach the visual-feedback producer. Key press/release notifications
    /// are pushed here; a full or missing queue is silently ignored.
    pub fn with_feedback(mut self, feedback: Producer<KeyEvent>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Start a voice for the named note.
    ///
    /// No-ops, never errors: an unknown identifier, or a note that already
    /// has an active voice (key repeat, multi-touch on the same key), both
    /// leave the manager unchanged.
    pub fn note_on(&mut self, name: &str) {
        let Some(note) = Note::from_name(name) else {
            return;
        };
        if self.active.contains_key(&note) {
            return;
        }
        self.reap_expired_tails();

        let voice = Voice::new(note, self.sample_rate, self.shape);
        self.active.insert(note, voice);
        self.notify(KeyEvent::Pressed(note));
    }

    /// Release the named note.
    ///
    /// The note leaves the active set immediately; the voice moves to the
    /// tail list and keeps fading for its release window. Unknown or
    /// inactive notes are a no-op.
    pub fn note_off(&mut self, name: &str) {
        let Some(note) = Note::from_name(name) else {
            return;
        };
        let Some(mut voice) = self.active.remove(&note) else {
            return;
        };
        debug_assert_eq!(voice.note(), note);
        self.reap_expired_tails();

        voice.release();
        self.tails.push(voice);
        self.notify(KeyEvent::Released(note));
    }

    /// Release every active note.
    pub fn stop_all(&mut self) {
        // Snapshot the key set: note_off mutates the map while we iterate.
        let held: Vec<Note> = self.active.keys().copied().collect();
        for note in held {
            self.note_off(note.name());
        }
    }

    /// Mix every voice (active and releasing) additively into the buffer,
    /// then reap tails that have finished. Called from the audio callback.
    pub fn render_block(&mut self, out: &mut [f32]) {
        for voice in self.active.values_mut() {
            voice.render(out);
        }
        for voice in &mut self.tails {
            voice.render(out);
        }
        self.reap_expired_tails();
    }

    /// Drop tails past their deadline. Runs on every mutation as well as
    /// after each rendered block, so the tail list stays bounded even when
    /// no audio stream is pulling `render_block`.
    fn reap_expired_tails(&mut self) {
        self.tails.retain(|v| !v.is_finished());
    }

    /// Whether the note currently has a Sounding voice.
    pub fn is_active(&self, note: Note) -> bool {
        self.active.contains_key(&note)
    }

    /// Notes with a Sounding voice, in ascending pitch order.
    pub fn active_notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.active.keys().copied().collect();
        notes.sort();
        notes
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of voices still fading out after release.
    pub fn tail_count(&self) -> usize {
        self.tails.len()
    }

    /// Envelope level of the note's active voice, if any.
    pub fn envelope_level(&self, note: Note) -> Option<f32> {
        self.active.get(&note).map(|v| v.envelope_level())
    }

    fn notify(&mut self, event: KeyEvent) {
        if let Some(feedback) = &mut self.feedback {
            let _ = feedback.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn fast_shape() -> EnvelopeShape {
        EnvelopeShape {
            attack_time: 0.005,
            peak_level: 0.5,
            decay_time: 0.01,
            sustain_level: 0.3,
            release_time: 0.02,
        }
    }

    fn manager() -> VoiceManager {
        VoiceManager::with_shape(SAMPLE_RATE, fast_shape())
    }

    #[test]
    fn repeated_press_keeps_one_voice() {
        let mut vm = manager();
        vm.note_on("C4");
        vm.note_on("C4");

        assert_eq!(vm.active_count(), 1);
        assert_eq!(vm.active_notes(), vec![Note::C4]);
        assert_eq!(vm.tail_count(), 0);
    }

    #[test]
    fn release_of_inactive_note_is_a_no_op() {
        let mut vm = manager();
        vm.note_off("E4");
        assert_eq!(vm.active_count(), 0);
        assert_eq!(vm.tail_count(), 0);
    }

    #[test]
    fn unknown_identifier_is_ignored() {
        let mut vm = manager();
        vm.note_on("Zz9");
        vm.note_off("Zz9");
        assert_eq!(vm.active_count(), 0);
    }

    #[test]
    fn release_is_logically_immediate() {
        let mut vm = manager();
        vm.note_on("C4");
        vm.note_off("C4");

        // Gone from the active set even though the tail is still rendering
        assert!(!vm.is_active(Note::C4));
        assert_eq!(vm.active_count(), 0);
        assert_eq!(vm.tail_count(), 1);
    }

    #[test]
    fn press_press_release_release_scenario() {
        let mut vm = manager();
        vm.note_on("C4");
        assert_eq!(vm.active_notes(), vec![Note::C4]);

        vm.note_on("C4");
        assert_eq!(vm.active_notes(), vec![Note::C4]);

        vm.note_off("C4");
        assert!(vm.active_notes().is_empty());

        vm.note_off("C4"); // again: no error, no change
        assert!(vm.active_notes().is_empty());
    }

    #[test]
    fn chord_then_stop_all() {
        let mut vm = manager();
        vm.note_on("C4");
        vm.note_on("E4");
        vm.note_on("G4");
        assert_eq!(vm.active_notes(), vec![Note::C4, Note::E4, Note::G4]);

        vm.stop_all();
        assert!(vm.active_notes().is_empty());
        assert_eq!(vm.tail_count(), 3);
    }

    #[test]
    fn repress_during_tail_starts_independent_voice() {
        let mut vm = manager();
        vm.note_on("A4");
        vm.note_off("A4");
        assert_eq!(vm.tail_count(), 1);

        // Immediate re-press: new voice while the old tail still fades
        vm.note_on("A4");
        assert!(vm.is_active(Note::A4));
        assert_eq!(vm.active_count(), 1);
        assert_eq!(vm.tail_count(), 1);

        // Rendering drops the old tail after release + margin without
        // touching the new voice
        let mut buf = vec![0.0f32; 256];
        vm.render_block(&mut buf);
        assert_eq!(vm.tail_count(), 0);
        assert!(vm.is_active(Note::A4));
    }

    #[test]
    fn tails_render_sound_then_get_reaped() {
        let mut vm = manager();
        vm.note_on("C5");

        let mut buf = vec![0.0f32; 32];
        vm.render_block(&mut buf);
        vm.note_off("C5");

        // During the release window the tail is still audible
        let mut tail_buf = vec![0.0f32; 10];
        vm.render_block(&mut tail_buf);
        assert!(tail_buf.iter().any(|&s| s.abs() > 0.0));
        assert_eq!(vm.tail_count(), 1);

        // Past release + margin the voice is reclaimed
        let mut rest = vec![0.0f32; 256];
        vm.render_block(&mut rest);
        assert_eq!(vm.tail_count(), 0);
    }

    #[test]
    fn same_note_tails_may_overlap() {
        let mut vm = manager();
        for _ in 0..3 {
            vm.note_on("D4");
            vm.note_off("D4");
        }
        assert_eq!(vm.tail_count(), 3);
        assert_eq!(vm.active_count(), 0);
    }

    #[test]
    fn feedback_events_mirror_lifecycle() {
        let (tx, mut rx) = RingBuffer::<KeyEvent>::new(16);
        let mut vm = manager().with_feedback(tx);

        vm.note_on("C4");
        vm.note_on("C4"); // idempotent press: no second event
        vm.note_off("C4");
        vm.note_off("C4"); // redundant release: no event
        vm.note_on("Zz9"); // unknown: no event

        assert_eq!(rx.pop(), Ok(KeyEvent::Pressed(Note::C4)));
        assert_eq!(rx.pop(), Ok(KeyEvent::Released(Note::C4)));
        assert!(rx.pop().is_err(), "no further events expected");
    }

    #[test]
    fn stop_all_on_empty_manager_is_fine() {
        let mut vm = manager();
        vm.stop_all();
        assert_eq!(vm.active_count(), 0);
    }
}
