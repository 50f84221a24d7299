//! Error types for the render module.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while exporting or summarizing a script.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Requested export format is not one of the supported formats.
    #[error("unsupported format: {format}")]
    InvalidFormat { format: String },

    /// Staging directory or input file could not be prepared.
    #[error("failed to stage input: {reason}")]
    Staging {
        reason: String,
        #[source]
        source: std::io::Error,
    },

    /// OpenSCAD did not finish before the deadline and was killed.
    #[error("openscad command timed out after {timeout:?}")]
    DeadlineExceeded { timeout: Duration },

    /// OpenSCAD could not be spawned or exited unsuccessfully.
    #[error("openscad command failed: {reason}, output: {output}")]
    ProcessFailed { reason: String, output: String },

    /// OpenSCAD reported success but the expected output is missing.
    #[error("failed to read output file {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rendered bytes are not a decodable raster image.
    #[error("failed to decode PNG: {reason}")]
    Decode { reason: String },

    /// Target codec rejected the pixel data.
    #[error("failed to encode {codec}: {reason}")]
    Encode { codec: &'static str, reason: String },

    /// Summary output is not a JSON object.
    #[error("failed to parse summary JSON: {reason}")]
    Parse { reason: String },
}

impl RenderError {
    /// Creates a staging error from an I/O failure.
    pub fn staging(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::Staging {
            reason: reason.into(),
            source,
        }
    }

    /// Creates a process failure carrying the combined output.
    pub fn process_failed(reason: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            output: output.into(),
        }
    }

    /// Whether this error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. })
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "invalid_format",
            Self::Staging { .. } => "staging",
            Self::DeadlineExceeded { .. } => "timeout",
            Self::ProcessFailed { .. } => "process_failed",
            Self::ReadFailed { .. } => "read_failed",
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::Parse { .. } => "parse",
        }
    }
}
