//! gifrec CLI - convert captured frames into animated GIFs
//!
//! This crate provides a command-line interface for:
//! - Converting image files or frame directories into a GIF
//! - Managing the gifrec configuration file

pub mod cli;
pub mod config;
pub mod frames;
pub mod output;

#[cfg(test)]
mod proptests;

use gifrec_core::ConvertError;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{OutputFormat, Report, Reporter};

/// Exit codes for CLI operations
///
/// - 0: Success - GIF written or command completed
/// - 1: General error - unspecified error occurred
/// - 2: Invalid input - no frames, bad config, unreadable frame list
/// - 3: No frames processable - every frame was skipped
/// - 4: I/O failure - output could not be created or written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Invalid input provided (exit code 2)
    InvalidInput = 2,
    /// No frame survived decoding and filtering (exit code 3)
    NoFramesProcessable = 3,
    /// Storage failure (exit code 4)
    IoError = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&ConvertError> for ExitCode {
    fn from(err: &ConvertError) -> Self {
        if let ConvertError::NoFramesProcessable { .. } = err {
            ExitCode::NoFramesProcessable
        } else if err.is_input_error() {
            ExitCode::InvalidInput
        } else if err.is_io_error() {
            ExitCode::IoError
        } else {
            ExitCode::GeneralError
        }
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::NoFramesProcessable => "NO_FRAMES",
            ExitCode::IoError => "IO_ERROR",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::InvalidInput => "Invalid arguments, configuration or frame list",
            ExitCode::NoFramesProcessable => "None of the supplied frames could be encoded",
            ExitCode::IoError => "The output file could not be written",
        }
    }
}
