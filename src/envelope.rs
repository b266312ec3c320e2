//! Breakpoint envelopes for amplitude and frequency shaping
//!
//! An envelope is an ordered list of control points over normalized kick
//! time (0.0 = kick start, 1.0 = kick end). The renderer samples it once
//! per frame and multiplies the oscillator's base amplitude or frequency
//! by the interpolated value.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// An envelope never shrinks below this many control points.
pub const MIN_ENVELOPE_POINTS: usize = 2;

/// Which parameter an envelope modulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Amplitude,
    Frequency,
}

/// A single control point: normalized time in [0, 1] and a multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    pub time: f32,
    pub value: f32,
}

impl EnvelopePoint {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }

    fn is_valid(&self) -> bool {
        self.time.is_finite()
            && (0.0..=1.0).contains(&self.time)
            && self.value.is_finite()
            && self.value >= 0.0
    }
}

/// Piecewise-linear curve over normalized kick time.
///
/// Invariants held at all times: at least [`MIN_ENVELOPE_POINTS`] points,
/// times strictly increasing, first point anchored at t = 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EnvelopePoint>", into = "Vec<EnvelopePoint>")]
pub struct Envelope {
    points: Vec<EnvelopePoint>,
}

impl Envelope {
    /// A constant envelope holding `value` over the whole kick.
    pub fn flat(value: f32) -> Self {
        Self {
            points: vec![EnvelopePoint::new(0.0, value), EnvelopePoint::new(1.0, value)],
        }
    }

    /// Build an envelope from explicit points, validating the invariants.
    pub fn from_points(points: Vec<EnvelopePoint>) -> Result<Self, EngineError> {
        if points.len() < MIN_ENVELOPE_POINTS {
            return Err(EngineError::MinimumPointsViolation(MIN_ENVELOPE_POINTS));
        }
        if points[0].time != 0.0 {
            return Err(EngineError::InvalidOrder);
        }
        for pair in points.windows(2) {
            if pair[1].time <= pair[0].time {
                return Err(EngineError::InvalidOrder);
            }
        }
        if let Some(p) = points.iter().find(|p| !p.is_valid()) {
            return Err(EngineError::Configuration(format!(
                "envelope point ({}, {}) outside valid range",
                p.time, p.value
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[EnvelopePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Sample the curve at normalized time `t`.
    ///
    /// Linear interpolation between the bracketing points; clamps to the
    /// first/last point's value outside the covered range.
    pub fn value_at(&self, t: f32) -> f32 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        // t is strictly inside, so a bracketing pair exists.
        let upper = self
            .points
            .iter()
            .position(|p| p.time >= t)
            .unwrap_or(self.points.len() - 1);
        let b = self.points[upper];
        let a = self.points[upper - 1];
        if b.time == t {
            return b.value;
        }
        let frac = (t - a.time) / (b.time - a.time);
        a.value + (b.value - a.value) * frac
    }

    /// Insert a new control point, keeping time order. Returns the index
    /// the point landed at.
    pub fn add_point(&mut self, time: f32, value: f32) -> Result<usize, EngineError> {
        let point = EnvelopePoint::new(time, value);
        if !point.is_valid() {
            return Err(EngineError::Configuration(format!(
                "envelope point ({time}, {value}) outside valid range"
            )));
        }
        if self.points.iter().any(|p| p.time == time) {
            return Err(EngineError::InvalidOrder);
        }
        let index = self.points.partition_point(|p| p.time < time);
        self.points.insert(index, point);
        Ok(index)
    }

    /// Remove the point at `index`.
    ///
    /// The t = 0 anchor cannot be removed, and the envelope never shrinks
    /// below [`MIN_ENVELOPE_POINTS`].
    pub fn remove_point(&mut self, index: usize) -> Result<EnvelopePoint, EngineError> {
        if index >= self.points.len() {
            return Err(EngineError::InvalidIndex(index));
        }
        if self.points.len() <= MIN_ENVELOPE_POINTS {
            return Err(EngineError::MinimumPointsViolation(MIN_ENVELOPE_POINTS));
        }
        if index == 0 {
            return Err(EngineError::InvalidOrder);
        }
        Ok(self.points.remove(index))
    }

    /// Move an existing point to a new (time, value).
    ///
    /// The move must keep times strictly increasing relative to both
    /// neighbours; the anchor point can change value but not time.
    pub fn update_point(&mut self, index: usize, time: f32, value: f32) -> Result<(), EngineError> {
        if index >= self.points.len() {
            return Err(EngineError::InvalidIndex(index));
        }
        let point = EnvelopePoint::new(time, value);
        if !point.is_valid() {
            return Err(EngineError::Configuration(format!(
                "envelope point ({time}, {value}) outside valid range"
            )));
        }
        if index == 0 && time != 0.0 {
            return Err(EngineError::InvalidOrder);
        }
        if index > 0 && time <= self.points[index - 1].time {
            return Err(EngineError::InvalidOrder);
        }
        if index + 1 < self.points.len() && time >= self.points[index + 1].time {
            return Err(EngineError::InvalidOrder);
        }
        self.points[index] = point;
        Ok(())
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::flat(1.0)
    }
}

impl TryFrom<Vec<EnvelopePoint>> for Envelope {
    type Error = EngineError;

    fn try_from(points: Vec<EnvelopePoint>) -> Result<Self, Self::Error> {
        Self::from_points(points)
    }
}

impl From<Envelope> for Vec<EnvelopePoint> {
    fn from(envelope: Envelope) -> Self {
        envelope.points
    }
}
