pub mod biquad;

pub use self::biquad::Biquad;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

/// Per-oscillator filter settings as held in the percussion state.
///
/// These are plain parameters; the runtime [`Biquad`] is built from them
/// at the start of each render pass, so coefficient recomputation happens
/// on parameter change and never mid-buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub kind: FilterKind,
    pub enabled: bool,
    pub cutoff_hz: f32,
    pub q: f32,
}

impl FilterParams {
    pub fn low_pass(cutoff_hz: f32) -> Self {
        Self {
            kind: FilterKind::LowPass,
            enabled: false,
            cutoff_hz,
            q: std::f32::consts::FRAC_1_SQRT_2,
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::low_pass(5000.0)
    }
}
