use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CkksError {
    #[error("Invalid parameter: {message}")]
    Parameter { message: String },

    #[error("Encoding capacity exceeded: got {got} values, max {max} slots")]
    EncodingCapacity { got: usize, max: usize },

    #[error("Level mismatch: left operand at level {left}, right at level {right}")]
    LevelMismatch { left: usize, right: usize },

    #[error(
        "Scale mismatch: {left:.6e} vs {right:.6e} exceeds relative tolerance {tolerance:e}"
    )]
    ScaleMismatch {
        left: f64,
        right: f64,
        tolerance: f64,
    },

    #[error(
        "Modulus chain exhausted: cannot {operation} at level {level} \
         (no prime left to drop, or the result scale would not fit below the level modulus)"
    )]
    ChainExhausted {
        operation: &'static str,
        level: usize,
    },

    #[error("Key mismatch: {message}")]
    KeyMismatch { message: String },

    #[error("Invalid state for {operation}: expected {expected} components, got {actual}")]
    State {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid level {level}: must be at most {max}")]
    InvalidLevel { level: usize, max: usize },

    #[error("Operands belong to different contexts")]
    ContextMismatch,

    #[error(
        "Encoded coefficient needs {bits:.1} bits but level {level} only holds {limit:.1}"
    )]
    CoefficientOutOfRange { bits: f64, limit: f64, level: usize },

    #[error("Ring arithmetic failed: {source}")]
    Ring {
        #[from]
        source: crate::rings::RingError,
    },

    #[error("Key operation failed: {source}")]
    Key {
        #[from]
        source: crate::keys::KeyError,
    },
}

impl CkksError {
    pub(crate) fn parameter(message: impl Into<String>) -> Self {
        Self::Parameter {
            message: message.into(),
        }
    }
}

pub type CkksResult<T> = Result<T, CkksError>;
