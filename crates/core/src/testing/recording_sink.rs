//! Status sink that records what it receives.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::progress::{SinkError, StatusSink};

/// Records every rendering delivered to it; can be made slow or failing.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    updates: Arc<RwLock<Vec<String>>>,
    failing: Arc<RwLock<bool>>,
    failures: Arc<RwLock<usize>>,
    delay: Arc<RwLock<Duration>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every update fails.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    /// Delay applied to each update before it is recorded.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn updates(&self) -> Vec<String> {
        self.updates.read().await.clone()
    }

    pub async fn last_update(&self) -> Option<String> {
        self.updates.read().await.last().cloned()
    }

    /// Successful updates.
    pub async fn update_count(&self) -> usize {
        self.updates.read().await.len()
    }

    pub async fn failure_count(&self) -> usize {
        *self.failures.read().await
    }
}

#[async_trait]
impl StatusSink for RecordingSink {
    async fn update(&self, text: &str) -> Result<(), SinkError> {
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.failing.read().await {
            *self.failures.write().await += 1;
            return Err(SinkError::Delivery("sink unavailable".to_string()));
        }

        self.updates.write().await.push(text.to_string());
        Ok(())
    }
}
