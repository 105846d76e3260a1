//! Trait definitions for the fetch stage.

use async_trait::async_trait;

use super::error::FetchError;
use super::types::FetchedMedia;
use crate::progress::ProgressReporter;

/// Retrieves one media asset to local disk.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Fetches `id`, retrying up to `max_retries` times when the download stalls.
    ///
    /// Identifiers outside the safe alphabet fail with
    /// [`FetchError::InvalidIdentifier`] before any process is started.
    async fn fetch(
        &self,
        id: &str,
        max_retries: u32,
        progress: &ProgressReporter,
    ) -> Result<FetchedMedia, FetchError>;

    /// Validates that the tool is installed and runnable.
    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
