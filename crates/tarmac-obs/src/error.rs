//! Observation/action pipeline errors.

use std::error::Error;
use std::fmt;

/// Errors from space building and validation.
#[derive(Clone, Debug, PartialEq)]
pub enum ObsError {
    /// Low/high bound vectors differ in length.
    BoundShapeMismatch {
        /// Length of the low vector.
        low_len: usize,
        /// Length of the high vector.
        high_len: usize,
    },
    /// A low bound exceeds its high bound.
    InvertedBounds {
        /// Index of the offending dimension.
        index: usize,
    },
    /// The feature list is empty.
    EmptySpec,
    /// The controlled-vehicle cap is zero.
    ZeroAgentCap,
    /// Acceleration bounds must be positive and finite.
    InvalidActionBounds {
        /// Description of the offending bound.
        reason: String,
    },
}

impl fmt::Display for ObsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoundShapeMismatch { low_len, high_len } => {
                write!(f, "bound vectors differ: low {low_len}, high {high_len}")
            }
            Self::InvertedBounds { index } => {
                write!(f, "low bound exceeds high bound at dimension {index}")
            }
            Self::EmptySpec => write!(f, "observation spec has no features"),
            Self::ZeroAgentCap => write!(f, "max_controlled must be at least 1"),
            Self::InvalidActionBounds { reason } => {
                write!(f, "invalid action bounds: {reason}")
            }
        }
    }
}

impl Error for ObsError {}
