use std::time::Instant;

use crate::{
    dsp::envelope::{Envelope, EnvelopeShape},
    dsp::oscillator::{Oscillator, Waveform},
    notes::Note,
};

/// Extra time a released voice is kept alive past the end of its release
/// ramp, so teardown never truncates the audible tail.
pub const CLEANUP_MARGIN_SECS: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Sounding,  // Envelope in attack/decay/sustain, note held
    Releasing, // Note released, envelope ramping to zero
}

/// One sounding instance of a note: a tone generator plus an amplitude
/// envelope. A voice is born Sounding (the envelope attack starts in
/// `new`) and is dropped by its owner once `is_finished` reports that the
/// release tail has fully played out.
///
/// Idle is not a voice state: an idle note simply has no voice.
pub struct Voice {
    note: Note,
    state: VoiceState,
    sample_rate: f32,
    osc: Oscillator,
    env: Envelope,
    release_time: f32,
    /// Samples left until a Releasing voice may be reclaimed.
    tail_remaining: u32,
    /// Wall-clock moment of release. A tail also expires once this much
    /// real time has passed, so sessions where no audio is being rendered
    /// still reclaim released voices.
    released_at: Option<Instant>,
}

impl Voice {
    pub fn new(note: Note, sample_rate: f32, shape: EnvelopeShape) -> Self {
        let release_time = shape.release_time;
        let mut env = Envelope::new(shape);
        env.note_on();

        Self {
            note,
            state: VoiceState::Sounding,
            sample_rate,
            osc: Oscillator::new(Waveform::Triangle, note.frequency()),
            env,
            release_time,
            // Set properly on release; the full window as a fallback
            tail_remaining: ((release_time + CLEANUP_MARGIN_SECS) * sample_rate) as u32,
            released_at: None,
        }
    }

    /// Begin the release tail. Idempotent: releasing a Releasing voice
    /// neither restarts its ramp bookkeeping nor extends its tail.
    pub fn release(&mut self) {
        if self.state == VoiceState::Releasing {
            return;
        }

        self.env.note_off(self.sample_rate);
        self.state = VoiceState::Releasing;
        self.tail_remaining =
            ((self.release_time + CLEANUP_MARGIN_SECS) * self.sample_rate).round() as u32;
        self.released_at = Some(Instant::now());
    }

    /// Render this voice additively into the buffer.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample += self.osc.next_sample(self.sample_rate) * self.env.next_sample(self.sample_rate);
        }

        if self.state == VoiceState::Releasing {
            self.tail_remaining = self.tail_remaining.saturating_sub(out.len() as u32);
        }
    }

    /// True once a Releasing voice has played past its release window plus
    /// the cleanup margin, counted in rendered samples or in wall-clock
    /// time, whichever elapses first. Sounding voices are never finished.
    pub fn is_finished(&self) -> bool {
        if self.state != VoiceState::Releasing {
            return false;
        }
        self.tail_remaining == 0 || self.tail_deadline_passed()
    }

    fn tail_deadline_passed(&self) -> bool {
        match self.released_at {
            Some(at) => at.elapsed().as_secs_f32() >= self.release_time + CLEANUP_MARGIN_SECS,
            None => false,
        }
    }

    pub fn note(&self) -> Note {
        self.note
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Current envelope level (0.0 to 1.0), for metering and debugging.
    pub fn envelope_level(&self) -> f32 {
        self.env.level()
    }
}
