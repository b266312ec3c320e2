//! Kick-drum synthesis engine
//!
//! Two tonal oscillators plus a noise layer, each with breakpoint
//! envelopes and a per-oscillator biquad filter, mixed through an output
//! chain into a fixed-length kick buffer. [`engine::KickEngine`] is the
//! facade a GUI talks to: parameter edits coalesce into background
//! renders, finished buffers are published atomically to the audio
//! callback and the waveform preview, and presets round-trip through
//! `.gkick` JSON documents.

pub mod effects;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod filters;
pub mod gen;
pub mod renderer;
pub mod state;
pub mod utils;

// Platform abstraction layer
pub mod platform;

pub use engine::{EngineEvent, KickEngine};
pub use error::EngineError;
pub use state::PercussionState;
