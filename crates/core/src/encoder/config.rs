//! Configuration for the encoder.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::EncodeStrategy;

/// Configuration for the FFmpeg-based encoder and its admission gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Arguments placed before everything else.
    #[serde(default)]
    pub base_args: Vec<String>,

    /// Maximum encodes running at once across the process.
    #[serde(default = "default_parallel_encoders")]
    pub parallel_encoders: usize,

    /// Strategy used for jobs submitted from chat.
    #[serde(default)]
    pub strategy: EncodeStrategy,

    /// Output frame rate.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: String,

    /// NVENC preset for the GPU strategy.
    #[serde(default = "default_gpu_preset")]
    pub gpu_preset: String,

    /// Target video bitrate for the CPU strategy.
    #[serde(default = "default_cpu_bitrate")]
    pub cpu_bitrate: String,

    /// Output frame size for the CPU strategy.
    #[serde(default = "default_cpu_resolution")]
    pub cpu_resolution: String,

    /// Appended to the source path to name the output.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Additional ffmpeg arguments, inserted before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_program() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_parallel_encoders() -> usize {
    1
}

fn default_frame_rate() -> String {
    "29.97".to_string()
}

fn default_gpu_preset() -> String {
    "medium".to_string()
}

fn default_cpu_bitrate() -> String {
    "2M".to_string()
}

fn default_cpu_resolution() -> String {
    "1600x900".to_string()
}

fn default_output_suffix() -> String {
    "-recoded.mkv".to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            base_args: Vec::new(),
            parallel_encoders: default_parallel_encoders(),
            strategy: EncodeStrategy::default(),
            frame_rate: default_frame_rate(),
            gpu_preset: default_gpu_preset(),
            cpu_bitrate: default_cpu_bitrate(),
            cpu_resolution: default_cpu_resolution(),
            output_suffix: default_output_suffix(),
            extra_args: Vec::new(),
        }
    }
}

impl EncoderConfig {
    /// Creates a config that runs `program` with leading `base_args`.
    pub fn with_program(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            ..Default::default()
        }
    }

    /// Sets the number of concurrent encodes.
    pub fn with_parallel_encoders(mut self, n: usize) -> Self {
        self.parallel_encoders = n;
        self
    }

    /// Sets the default strategy.
    pub fn with_strategy(mut self, strategy: EncodeStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
