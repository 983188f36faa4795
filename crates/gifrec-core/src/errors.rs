//! Error types for gifrec core.
//!
//! Two layers of failure exist in a conversion run:
//! - [`FrameError`]: a single frame could not be used. The run logs it,
//!   counts it and moves on to the next frame.
//! - [`ConvertError`]: the run as a whole failed. Nothing at the output
//!   path should be treated as a valid file.

use thiserror::Error;

use crate::config::ConfigError;
use crate::sink::SinkError;

// ============================================================================
// Per-frame errors
// ============================================================================

/// Errors that disqualify one frame without aborting the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Compressed frame data is malformed or in an unsupported format
    #[error("frame decode failed: {reason}")]
    Decode { reason: String },

    /// Frame geometry disagrees with the run's canonical geometry
    #[error("frame is {}x{}, expected {}x{}", actual.0, actual.1, expected.0, expected.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

// ============================================================================
// Run-level errors
// ============================================================================

/// Errors that abort a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// No frames were supplied
    #[error("no frames to convert")]
    EmptyInput,

    /// Every supplied frame was skipped
    #[error("none of the {total} frames could be processed")]
    NoFramesProcessable { total: usize },

    /// Directory creation or other filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output stream failed while writing or flushing
    #[error("output stream failed: {0}")]
    Sink(#[from] SinkError),

    /// GIF format constraint violated
    #[error("GIF encoding failed: {0}")]
    Encode(String),

    /// Conversion tunables out of range
    #[error("invalid conversion config: {0}")]
    Config(#[from] ConfigError),

    /// The encoding worker terminated abnormally
    #[error("encoding worker failed: {0}")]
    Worker(String),
}

impl From<gif::EncodingError> for ConvertError {
    fn from(err: gif::EncodingError) -> Self {
        match err {
            gif::EncodingError::Io(io) => ConvertError::Io(io),
            other => ConvertError::Encode(other.to_string()),
        }
    }
}

impl ConvertError {
    /// True when the failure stems from what the caller supplied rather
    /// than from the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ConvertError::EmptyInput | ConvertError::Config(_) | ConvertError::Encode(_)
        )
    }

    /// True when the failure came from storage.
    pub fn is_io_error(&self) -> bool {
        matches!(self, ConvertError::Io(_) | ConvertError::Sink(_))
    }
}
