extern crate alloc;
use alloc::string::String;

use thiserror::Error;

/// Stable error classification for the invocation boundary.
///
/// Callers that only need to branch on failure class (retry with relaxed
/// quality, fix arguments, give up) can match on this instead of the full
/// [`QuantizeError`] variant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration value outside its documented range.
    Argument,
    /// Zero-dimension or malformed pixel geometry.
    InvalidImage,
    /// The decode collaborator failed.
    Decode,
    /// The encode collaborator failed.
    Encode,
    /// An allocation failed mid-run.
    OutOfMemory,
    /// The palette fidelity score fell below `quality_min`.
    QualityTooLow,
}

#[derive(Debug, Error)]
pub enum QuantizeError {
    #[error("{option} must be between {min} and {max}, got {value}")]
    OptionOutOfRange {
        option: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("quality_min {min} exceeds quality_max {max}")]
    QualityRangeInverted { min: u8, max: u8 },

    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("palette quality {achieved} is below the requested minimum {required}")]
    QualityTooLow { achieved: u8, required: u8 },

    #[error("allocation failed during {stage}")]
    OutOfMemory { stage: &'static str },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),
}

impl QuantizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OptionOutOfRange { .. } | Self::QualityRangeInverted { .. } => {
                ErrorKind::Argument
            }
            Self::ZeroDimension | Self::DimensionMismatch { .. } => ErrorKind::InvalidImage,
            Self::QualityTooLow { .. } => ErrorKind::QualityTooLow,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Encode(_) => ErrorKind::Encode,
        }
    }
}
