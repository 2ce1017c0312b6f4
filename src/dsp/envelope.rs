#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MIN_TIME;

/*
Amplitude Envelope
==================

A linear-ramp envelope generator with an explicit peak level:

  Level
  peak ┐    ╱╲
       │   ╱  ╲________
  sus  │  ╱            ╲
       │ ╱              ╲
  0.0  └╱────────────────╲──→ Time
       Attack Decay  (hold) Release

Unlike a classic ADSR that always attacks to 1.0, the attack target is a
shape parameter. The keyboard voice attacks to 0.2 in 20 ms, decays to a
0.15 sustain over 300 ms, holds there until note-off, then releases to zero
in 150 ms. Keeping peak and sustain in the shape (rather than scaling the
output) means the level is the actual gain applied to the oscillator.

The State Machine
-----------------

    Idle → Attack → Decay → Sustain
                \______|______/
                       │ note_off (from any non-idle stage)
                       ▼
                    Release → Idle

note_off snapshots the CURRENT level as the release ramp start, so releasing
mid-attack ramps down from wherever the level actually is instead of jumping
to the sustain level first. That discontinuity would be an audible click.

Release bookkeeping precomputes the total sample count at note_off time and
interpolates, so the ramp lands exactly on 0.0.
*/

/// Ramp targets and durations for one envelope.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeShape {
    /// Seconds to ramp 0 → peak.
    pub attack_time: f32,
    /// Level reached at the end of the attack ramp.
    pub peak_level: f32,
    /// Seconds to ramp peak → sustain.
    pub decay_time: f32,
    /// Level held until note-off.
    pub sustain_level: f32,
    /// Seconds to ramp current level → 0 after note-off.
    pub release_time: f32,
}

impl EnvelopeShape {
    /// The keyboard voice shape: fast attack to a low peak, long decay to a
    /// slightly lower sustain, short release.
    pub fn keyboard() -> Self {
        Self {
            attack_time: 0.02,
            peak_level: 0.2,
            decay_time: 0.3,
            sustain_level: 0.15,
            release_time: 0.15,
        }
    }
}

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Gate just went high, ramping up to peak
    Decay,   // Reached peak, ramping down to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

pub struct Envelope {
    shape: EnvelopeShape,

    // Runtime state (changes every sample)
    stage: EnvelopeState,
    level: f32,

    // Release bookkeeping (pre-calculated at note_off for precision)
    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new(shape: EnvelopeShape) -> Self {
        let shape = EnvelopeShape {
            attack_time: shape.attack_time.max(MIN_TIME),
            peak_level: shape.peak_level.clamp(0.0, 1.0),
            decay_time: shape.decay_time.max(MIN_TIME),
            sustain_level: shape.sustain_level.clamp(0.0, 1.0),
            release_time: shape.release_time.max(MIN_TIME),
        };

        Self {
            shape,
            stage: EnvelopeState::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Gate high: start the attack phase from zero.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: start the release phase from the current level.
    ///
    /// No-op while Idle; re-releasing during Release restarts the ramp from
    /// the current (already falling) level, which is still click-free.
    pub fn note_off(&mut self, sample_rate: f32) {
        if self.stage == EnvelopeState::Idle {
            return;
        }

        // Snapshot current level - we interpolate from here to 0
        self.release_start_level = self.level;
        self.release_total_samples =
            (self.shape.release_time * sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                let increment = self.shape.peak_level / (self.shape.attack_time * sample_rate);
                self.level += increment;

                if self.level >= self.shape.peak_level {
                    self.level = self.shape.peak_level;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.shape.sustain_level;
                let total_drop = self.shape.peak_level - target;
                let decrement = total_drop / (self.shape.decay_time * sample_rate);
                self.level -= decrement;

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.shape.sustain_level;
            }

            EnvelopeState::Release => {
                // Linear interpolation from release_start_level to 0
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// True while the envelope is producing output (not Idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    /// Current output level (0.0 to 1.0).
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Current stage of the state machine.
    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}
