use std::f32::consts::TAU;

use crate::envelope::Envelope;
use crate::filters::Biquad;
use crate::gen::{NoiseSource, Waveform};
use crate::state::OscillatorParams;

/// Runtime voice for one oscillator slot
///
/// Built from an [`OscillatorParams`] snapshot at the start of a render
/// pass and consumed sample by sample. The phase accumulator follows the
/// envelope-modulated frequency, so pitch drops glide instead of
/// stair-stepping; the noise source is seeded here, once per pass.
pub struct Oscillator {
    function: Waveform,
    amplitude: f32,
    frequency: f32,
    amplitude_envelope: Envelope,
    frequency_envelope: Envelope,
    phase: f32,
    sample_rate: f32,
    noise: NoiseSource,
    filter: Option<Biquad>,
}

impl Oscillator {
    pub fn new(params: &OscillatorParams, sample_rate: f32) -> Self {
        let filter = params
            .filter
            .enabled
            .then(|| Biquad::from_params(&params.filter, sample_rate));
        Self {
            function: params.function,
            amplitude: params.amplitude,
            frequency: params.frequency,
            amplitude_envelope: params.amplitude_envelope.clone(),
            frequency_envelope: params.frequency_envelope.clone(),
            phase: 0.0,
            sample_rate,
            noise: NoiseSource::with_seed(params.noise_seed),
            filter,
        }
    }

    /// Produce one sample at normalized kick time `t_norm` in [0, 1].
    pub fn next_sample(&mut self, t_norm: f32) -> f32 {
        let raw = if self.function.is_noise() {
            self.noise.next_sample()
        } else {
            let frequency = self.frequency * self.frequency_envelope.value_at(t_norm);
            let value = self.function.value_at_phase(self.phase);
            self.phase += TAU * frequency / self.sample_rate;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
            value
        };

        let amplitude = self.amplitude * self.amplitude_envelope.value_at(t_norm);
        let sample = raw * amplitude;
        match &mut self.filter {
            Some(filter) => filter.process(sample),
            None => sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterKind, FilterParams};

    fn sine_params(frequency: f32) -> OscillatorParams {
        OscillatorParams {
            function: Waveform::Sine,
            amplitude: 1.0,
            frequency,
            enabled: true,
            filter: FilterParams::default(),
            amplitude_envelope: Envelope::flat(1.0),
            frequency_envelope: Envelope::flat(1.0),
            noise_seed: 0,
        }
    }

    #[test]
    fn flat_sine_tracks_the_analytic_waveform() {
        let sample_rate = 44100.0;
        let mut osc = Oscillator::new(&sine_params(100.0), sample_rate);
        for i in 0..1000 {
            let expected = (TAU * 100.0 * i as f32 / sample_rate).sin();
            let got = osc.next_sample(0.5);
            assert!(
                (got - expected).abs() < 1e-3,
                "sample {}: {} vs {}",
                i,
                got,
                expected
            );
        }
    }

    #[test]
    fn amplitude_envelope_scales_output() {
        let mut params = sine_params(100.0);
        params.amplitude_envelope = Envelope::flat(0.5);
        let mut osc = Oscillator::new(&params, 44100.0);
        osc.next_sample(0.5);
        let peak = (0..441).fold(0.0f32, |acc, _| acc.max(osc.next_sample(0.5).abs()));
        assert!((peak - 0.5).abs() < 0.01, "peak {}", peak);
    }

    #[test]
    fn same_noise_seed_renders_the_same_pass() {
        let mut params = sine_params(100.0);
        params.function = Waveform::Noise;
        params.noise_seed = 99;
        let mut a = Oscillator::new(&params, 44100.0);
        let mut b = Oscillator::new(&params, 44100.0);
        for _ in 0..512 {
            assert_eq!(a.next_sample(0.2), b.next_sample(0.2));
        }
    }

    #[test]
    fn enabled_filter_changes_the_signal() {
        let mut filtered = sine_params(8000.0);
        filtered.filter = FilterParams {
            kind: FilterKind::LowPass,
            enabled: true,
            cutoff_hz: 200.0,
            q: 0.707,
        };
        let mut plain = Oscillator::new(&sine_params(8000.0), 44100.0);
        let mut lowpassed = Oscillator::new(&filtered, 44100.0);

        let peak_plain = (0..4096).fold(0.0f32, |acc, _| acc.max(plain.next_sample(0.5).abs()));
        let peak_filtered =
            (0..4096).fold(0.0f32, |acc, _| acc.max(lowpassed.next_sample(0.5).abs()));
        assert!(
            peak_filtered < peak_plain * 0.2,
            "8 kHz through a 200 Hz low-pass: {} vs {}",
            peak_filtered,
            peak_plain
        );
    }
}
