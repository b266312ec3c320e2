pub mod limiter;
pub mod saturation;

pub use self::limiter::*;
pub use self::saturation::*;

/// Trait for the output-chain effects applied after the oscillator mix
pub trait Effect: Send {
    /// Process a single audio sample through the effect
    fn process(&self, input: f32) -> f32;
}
