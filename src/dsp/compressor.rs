/*
Dynamics Compressor
===================

The shared output stage every voice mixes into. With up to 32 voices at a
0.2 envelope peak each, a dense chord can push the mix well past full scale;
the compressor pulls the loud passages down instead of letting them clip.

Design: a feed-forward peak compressor.

  1. Track the signal envelope with a fast-attack / slow-release peak
     follower (attack so the first loud transient is caught within a couple
     of milliseconds, release so gain comes back up smoothly).
  2. When the envelope exceeds the threshold, compute the gain that maps the
     overshoot through the ratio:

         gain = (threshold + (envelope - threshold) / ratio) / envelope

  3. Apply the (smoothed) gain per sample.

The defaults are deliberately gentle - this is a safety stage, not an
effect.
*/

const DEFAULT_THRESHOLD: f32 = 0.5;
const DEFAULT_RATIO: f32 = 4.0;
const DEFAULT_ATTACK: f32 = 0.003;
const DEFAULT_RELEASE: f32 = 0.25;

pub struct Compressor {
    threshold: f32,
    ratio: f32,
    // Per-sample smoothing coefficients derived from attack/release times
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
}

impl Compressor {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(
            sample_rate,
            DEFAULT_THRESHOLD,
            DEFAULT_RATIO,
            DEFAULT_ATTACK,
            DEFAULT_RELEASE,
        )
    }

    pub fn with_params(
        sample_rate: f32,
        threshold: f32,
        ratio: f32,
        attack: f32,
        release: f32,
    ) -> Self {
        // One-pole coefficient: after `time` seconds the follower covers
        // ~63% of a step. exp(-1 / (time * sample_rate))
        let coeff = |time: f32| (-1.0 / (time.max(1e-4) * sample_rate)).exp();

        Self {
            threshold: threshold.max(1e-3),
            ratio: ratio.max(1.0),
            attack_coeff: coeff(attack),
            release_coeff: coeff(release),
            envelope: 0.0,
        }
    }

    /// Compress a block in place.
    pub fn process(&mut self, buf: &mut [f32]) {
        for sample in buf.iter_mut() {
            let input_level = sample.abs();

            // Peak follower: fast up, slow down
            let coeff = if input_level > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = coeff * self.envelope + (1.0 - coeff) * input_level;

            let gain = if self.envelope > self.threshold {
                let compressed = self.threshold + (self.envelope - self.threshold) / self.ratio;
                compressed / self.envelope
            } else {
                1.0
            };

            *sample *= gain;
        }
    }
}
