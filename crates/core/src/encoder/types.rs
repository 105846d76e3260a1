//! Types for the encoder module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How a file is re-encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeStrategy {
    /// One NVENC pass with CUDA decoding.
    GpuSinglePass,
    /// Two libx264 passes at a fixed bitrate and frame size.
    #[default]
    CpuTwoPass,
}

impl EncodeStrategy {
    /// Passes run by this strategy, in order.
    pub fn passes(&self) -> &'static [EncodePass] {
        match self {
            Self::GpuSinglePass => &[EncodePass::Single],
            Self::CpuTwoPass => &[EncodePass::First, EncodePass::Second],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GpuSinglePass => "gpu_single_pass",
            Self::CpuTwoPass => "cpu_two_pass",
        }
    }
}

impl fmt::Display for EncodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encoder invocation within a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodePass {
    Single,
    First,
    Second,
}

impl EncodePass {
    /// Value for ffmpeg's `-pass` option.
    pub fn number(&self) -> Option<u8> {
        match self {
            Self::Single => None,
            Self::First => Some(1),
            Self::Second => Some(2),
        }
    }

    /// Status line shown when the pass starts.
    pub fn start_message(&self) -> &'static str {
        match self {
            Self::Single => "Recoding...",
            Self::First => "Recoding, first pass...",
            Self::Second => "Recoding, second pass...",
        }
    }
}

impl fmt::Display for EncodePass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::First => "first",
            Self::Second => "second",
        })
    }
}

/// A single encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub pass: EncodePass,
}

impl EncodeRequest {
    /// Two-pass statistics are keyed by the source path.
    pub fn passlog(&self) -> &Path {
        &self.input
    }
}

/// A finished transcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcoded {
    /// File actually encoded (may differ from the reported name after remuxing).
    pub input: PathBuf,
    pub output: PathBuf,
    pub strategy: EncodeStrategy,
    /// Whether the job waited for an encoder slot.
    pub queued: bool,
    pub duration_ms: u64,
}

/// Output path for a source file: the source path with `suffix` appended.
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut raw = input.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}
