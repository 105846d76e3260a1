//! Error types for the fetch stage.

use std::path::PathBuf;
use thiserror::Error;

use crate::media_id::InvalidMediaId;

/// Errors that end a fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Identifier contains characters outside the safe alphabet. No process was started.
    #[error("Invalid identifier: {id:?}")]
    InvalidIdentifier { id: String },

    /// The tool produced no metadata line.
    #[error("Fetch tool produced no metadata")]
    NoMetadata,

    /// The metadata line was not a JSON object.
    #[error("Malformed metadata: {reason}")]
    MalformedMetadata { reason: String },

    /// Every attempt stalled past the timeout.
    #[error("Download stalled after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    /// The tool exited on its own with a failure status.
    #[error("Fetch tool exited with code {code:?}")]
    ToolFailed {
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// The tool could not be started.
    #[error("Fetch tool not found: {program}")]
    ToolUnavailable { program: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::NoMetadata => "no_metadata",
            Self::MalformedMetadata { .. } => "malformed_metadata",
            Self::Timeout { .. } => "timeout",
            Self::ToolFailed { .. } => "tool_failed",
            Self::ToolUnavailable { .. } => "tool_unavailable",
            Self::Io(_) => "io",
        }
    }
}

impl From<InvalidMediaId> for FetchError {
    fn from(err: InvalidMediaId) -> Self {
        Self::InvalidIdentifier { id: err.0 }
    }
}
