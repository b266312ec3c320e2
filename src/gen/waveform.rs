use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Waveform function of one oscillator.
///
/// `Noise` is generated from a seeded random source rather than a phase,
/// so [`Waveform::value_at_phase`] covers only the tonal variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    Noise,
}

impl Waveform {
    pub fn is_noise(&self) -> bool {
        matches!(self, Waveform::Noise)
    }

    /// Evaluate the tonal waveform at `phase` (radians). `Noise` yields
    /// silence here; the oscillator pulls it from its noise source instead.
    pub fn value_at_phase(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                if phase.sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => (2.0 / PI) * phase.sin().asin(),
            Waveform::Sawtooth => {
                let cycles = phase / (2.0 * PI);
                2.0 * (cycles - (cycles + 0.5).floor())
            }
            Waveform::Noise => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonal_waveforms_stay_in_unit_range() {
        let waveforms = [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Triangle,
            Waveform::Sawtooth,
        ];
        for waveform in waveforms {
            for i in 0..1000 {
                let phase = i as f32 * 0.013;
                let v = waveform.value_at_phase(phase);
                assert!(
                    (-1.0..=1.0).contains(&v),
                    "{:?} out of range at phase {}: {}",
                    waveform,
                    phase,
                    v
                );
            }
        }
    }

    #[test]
    fn sine_starts_at_zero() {
        assert_eq!(Waveform::Sine.value_at_phase(0.0), 0.0);
    }

    #[test]
    fn square_flips_sign_at_half_period() {
        assert_eq!(Waveform::Square.value_at_phase(0.1), 1.0);
        assert_eq!(Waveform::Square.value_at_phase(PI + 0.1), -1.0);
    }
}
