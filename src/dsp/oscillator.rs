#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

/*
Oscillator
==========

A phase-accumulator oscillator: `phase` walks through [0, 1) at
`frequency / sample_rate` per sample, and the waveform function maps phase
to an output sample in [-1, 1].

The keyboard voice uses Triangle - soft odd harmonics falling off as 1/n²,
mellow enough that a two-handed chord through the output compressor stays
pleasant. The other shapes are kept for patch experiments.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Saw,
}

pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    /// Advance one sample and return the output in [-1, 1].
    #[inline]
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let sample = match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Triangle => {
                // Rising ramp -1 → 1 over the first half period, falling back
                // over the second: 1 - 4*|phase - 0.5| shifted to start at -1.
                4.0 * (self.phase - (self.phase + 0.5).floor()).abs() - 1.0
            }
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * self.phase - 1.0,
        };

        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Render a block, writing samples into the buffer.
    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn sine_matches_reference() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0);
        let mut buffer = vec![0.0f32; 128];
        osc.render(&mut buffer, SAMPLE_RATE);

        // sample n should be sin(2pi f n / sr)
        let sample_index = 12;
        let expected = (TAU * 440.0 * sample_index as f32 / SAMPLE_RATE).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn triangle_starts_at_negative_peak_and_stays_bounded() {
        let mut osc = Oscillator::new(Waveform::Triangle, 261.63);
        let mut buffer = vec![0.0f32; 1024];
        osc.render(&mut buffer, SAMPLE_RATE);

        assert!((buffer[0] - -1.0).abs() < 1e-6);
        assert!(buffer.iter().all(|s| (-1.0..=1.0).contains(s)));
        // It must actually oscillate
        assert!(buffer.iter().any(|&s| s > 0.9));
    }

    #[test]
    fn triangle_period_matches_frequency() {
        let freq = 1_000.0;
        let mut osc = Oscillator::new(Waveform::Triangle, freq);
        let period = (SAMPLE_RATE / freq) as usize;

        let mut buffer = vec![0.0f32; period * 2];
        osc.render(&mut buffer, SAMPLE_RATE);

        // One full period later the waveform repeats
        assert!((buffer[0] - buffer[period]).abs() < 1e-3);
        assert!((buffer[5] - buffer[period + 5]).abs() < 1e-3);
    }
}
