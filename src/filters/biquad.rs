use std::f32::consts::PI;

use super::{FilterKind, FilterParams};

/// Biquad filter - RBJ Audio EQ Cookbook implementation
///
/// One 2nd-order section covering the low-pass, high-pass and band-pass
/// responses used for per-oscillator tone shaping. Direct Form I
/// processing; coefficients are computed once at construction from the
/// oscillator's [`FilterParams`].
pub struct Biquad {
    // Normalized coefficients
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // State variables (delay line)
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Build a filter for one render pass.
    ///
    /// Cutoff is clamped to 20 Hz .. 95% of Nyquist and Q to 0.1 .. 100,
    /// mirroring the validation the engine applies on the way in.
    pub fn from_params(params: &FilterParams, sample_rate: f32) -> Self {
        let nyquist = sample_rate * 0.5;
        let freq = params.cutoff_hz.clamp(20.0, nyquist * 0.95);
        let q = params.q.clamp(0.1, 100.0);

        let omega0 = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega0.sin();
        let cos_omega = omega0.cos();
        let alpha = sin_omega / (2.0 * q);

        let (b0, b1, b2) = match params.kind {
            FilterKind::LowPass => {
                let b1 = 1.0 - cos_omega;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterKind::HighPass => {
                let b1 = -(1.0 + cos_omega);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
            FilterKind::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Reset filter state (clear delay line)
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Process a single sample through the filter
    ///
    /// Direct Form I: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        // Flush denormals so long silent tails cost nothing.
        if output.abs() < 1e-15 {
            return 0.0;
        }

        output
    }
}
