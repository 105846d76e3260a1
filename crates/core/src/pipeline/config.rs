//! Configuration for the pipeline orchestrator.

use crate::config::Config;

/// Settings the orchestrator needs from the wider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Stall retries allowed per fetch.
    pub max_retries: u32,
    /// Encoder gate capacity.
    pub parallel_encoders: usize,
    /// Appended to the source path to name the output.
    pub output_suffix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            parallel_encoders: 1,
            output_suffix: "-recoded.mkv".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_parallel_encoders(mut self, n: usize) -> Self {
        self.parallel_encoders = n;
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_retries: config.fetcher.max_retries,
            parallel_encoders: config.encoder.parallel_encoders,
            output_suffix: config.encoder.output_suffix.clone(),
        }
    }
}
