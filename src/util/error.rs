//! Error types for docalign.

use thiserror::Error;

/// Result alias for docalign operations.
pub type DocAlignResult<T> = std::result::Result<T, DocAlignError>;

/// Errors that can occur when aligning a document to a template.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DocAlignError {
    /// The pixel layout is malformed or uses an unsupported channel count.
    #[error("invalid image: {reason}")]
    InvalidImage {
        /// Human-readable reason.
        reason: &'static str,
    },
    /// Width or height is zero or overflows the address space.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },
    /// The backing buffer is shorter than the layout requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall {
        /// Minimum number of elements required.
        needed: usize,
        /// Number of elements provided.
        got: usize,
    },
    /// The backing buffer is longer than the declared layout.
    #[error("buffer size mismatch: expected {expected} elements, got {got}")]
    BufferSizeMismatch {
        /// Exact number of elements implied by the layout.
        expected: usize,
        /// Number of elements provided.
        got: usize,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Fewer than four correspondences survived filtering.
    #[error("Found less than 4 matches")]
    InsufficientCorrespondences {
        /// Number of correspondences that were retained.
        retained: usize,
    },
    /// The correspondences do not constrain a planar transform.
    #[error("Degenerate match geometry: {reason}")]
    DegenerateGeometry {
        /// Human-readable reason.
        reason: &'static str,
    },
    /// The estimated transform cannot be inverted.
    #[error("estimated transform is singular and cannot be inverted")]
    SingularTransform,
    /// A keypoint extractor failed on one of the inputs.
    #[error("keypoint extraction failed on the {role} ({width}x{height}): {reason}")]
    Extraction {
        /// Which input was being processed (`image` or `template`).
        role: &'static str,
        /// Input width in pixels.
        width: usize,
        /// Input height in pixels.
        height: usize,
        /// Underlying failure.
        reason: String,
    },
    /// Image decoding or encoding failed.
    #[error("image I/O error: {reason}")]
    ImageIo {
        /// Underlying failure.
        reason: String,
    },
}

impl DocAlignError {
    /// Returns true for the failures a caller can recover from by changing
    /// parameters or inputs (the pipeline's partial-failure outcomes).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DocAlignError::InsufficientCorrespondences { .. }
                | DocAlignError::DegenerateGeometry { .. }
        )
    }
}
