//! Error types for cluedoid.

use thiserror::Error;

/// Result alias for cluedoid operations.
pub type IdentResult<T> = std::result::Result<T, IdentError>;

/// Errors raised while building frames, templates and configuration.
///
/// The identification path itself never returns these; it reports failure
/// through [`crate::Verdict`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The pixel buffer does not match the declared dimensions.
    #[error("buffer size mismatch: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// Template cannot be used for correlation (e.g. zero variance).
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// Image decode or encode failure.
    #[error("image I/O error: {reason}")]
    ImageIo { reason: String },
    /// Filesystem failure while loading templates or writing detections.
    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },
}
