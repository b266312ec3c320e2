use thiserror::Error;

/// Error taxonomy shared by the envelope editor surface, the preset
/// serialization boundary and the engine parameter API.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An envelope point (or oscillator) index is out of range.
    #[error("index {0} out of range")]
    InvalidIndex(usize),

    /// An envelope edit would break the strictly-increasing time order
    /// or move the anchor point away from t = 0.
    #[error("envelope point times must stay strictly increasing from 0")]
    InvalidOrder,

    /// An envelope must keep at least two control points.
    #[error("an envelope must keep at least {0} control points")]
    MinimumPointsViolation(usize),

    /// The preset document is malformed or missing required fields.
    #[error("preset parse error: {0}")]
    Parse(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A parameter value is outside its valid numeric range.
    #[error("configuration error: {0}")]
    Configuration(String),
}
