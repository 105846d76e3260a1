//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::EncodePass;

/// Errors that can occur during a transcode.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Neither the reported file nor its remuxed sibling exists.
    #[error("Downloaded file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The encoder exited with a failure status.
    #[error("Encoding failed in {pass} pass")]
    EncodeFailed {
        pass: EncodePass,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// FFmpeg binary not found.
    #[error("Encoder not found: {program}")]
    ToolUnavailable { program: PathBuf },

    /// The gate was closed while the job was queued.
    #[error("Encoder gate closed")]
    GateClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates an encode failure for `pass`.
    pub fn encode_failed(pass: EncodePass, code: Option<i32>, stderr: Option<String>) -> Self {
        Self::EncodeFailed { pass, code, stderr }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "file_not_found",
            Self::EncodeFailed { .. } => "encode_failed",
            Self::ToolUnavailable { .. } => "tool_unavailable",
            Self::GateClosed => "gate_closed",
            Self::Io(_) => "io",
        }
    }
}
