use async_trait::async_trait;
use std::sync::Arc;
use tuberecode_core::{Config, Encoder, Fetcher, Pipeline, PipelineStatus, SanitizedConfig};

/// Read access to the pipeline for the status server.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self) -> PipelineStatus;
}

#[async_trait]
impl<F: Fetcher + 'static, E: Encoder + 'static> StatusSource for Pipeline<F, E> {
    async fn status(&self) -> PipelineStatus {
        Pipeline::status(self).await
    }
}

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<dyn StatusSource>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<dyn StatusSource>) -> Self {
        Self { config, pipeline }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub async fn pipeline_status(&self) -> PipelineStatus {
        self.pipeline.status().await
    }
}
