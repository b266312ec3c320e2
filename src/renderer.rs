//! Mixer/renderer: turns a percussion state into the kick buffer
//!
//! The whole kick is rendered offline in one pass; the realtime callback
//! only plays back the finished buffer. Rendering the same state twice
//! yields identical buffers; the noise seed lives in the state, so even
//! the noise layer repeats until explicitly regenerated.

use crate::effects::{Effect, Limiter, Saturation};
use crate::gen::Oscillator;
use crate::state::PercussionState;

/// Render the kick described by `state` at `sample_rate`.
///
/// For every frame: sample each enabled oscillator (envelope-modulated
/// frequency and amplitude, then its filter), sum, run the output chain
/// (saturation, then the soft-clip limiter) and sanitize non-finite
/// values to silence. The render path never propagates errors.
pub fn render(state: &PercussionState, sample_rate: u32) -> Vec<f32> {
    let sr = sample_rate as f32;
    let frames = ((state.kick_length * sr).round() as usize).max(1);

    let mut voices: Vec<Oscillator> = state
        .oscillators
        .iter()
        .filter(|osc| osc.enabled && osc.amplitude > 0.0)
        .map(|osc| Oscillator::new(osc, sr))
        .collect();

    let saturation = state
        .saturation
        .enabled
        .then(|| Saturation::new(state.saturation.drive));
    let limiter = Limiter::new(state.limiter);

    let inv_length = 1.0 / state.kick_length;
    let mut buffer = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f32 / sr;
        let t_norm = (t * inv_length).min(1.0);

        let mut sum = 0.0;
        for voice in &mut voices {
            sum += voice.next_sample(t_norm);
        }
        if let Some(saturation) = &saturation {
            sum = saturation.process(sum);
        }
        let mut out = limiter.process(sum);
        if !out.is_finite() {
            out = 0.0;
        }
        buffer.push(out);
    }
    buffer
}
