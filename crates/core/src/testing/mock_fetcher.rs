//! Mock fetcher for testing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, FetchMetadata, FetchedMedia, Fetcher};
use crate::media_id::MediaId;
use crate::progress::ProgressReporter;

/// Mock implementation of the Fetcher trait.
///
/// Identifiers are validated like the real fetcher. Valid ones are recorded
/// and answered with a metadata record naming the configured file, or with no
/// filename at all.
///
/// # Example
///
/// ```rust,ignore
/// use tuberecode_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::returning("/tmp/clip.mkv");
/// fetcher.set_next_error(FetchError::NoMetadata).await;
///
/// // ...
/// assert_eq!(fetcher.recorded_fetches().await, vec!["abc".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct MockFetcher {
    /// File reported by successful fetches.
    filename: Arc<RwLock<Option<PathBuf>>>,
    /// Identifiers fetched, in call order.
    fetches: Arc<RwLock<Vec<String>>>,
    /// If set, the next fetch fails with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
    /// Simulated download duration.
    delay: Arc<RwLock<Duration>>,
}

impl MockFetcher {
    fn with_filename(filename: Option<PathBuf>) -> Self {
        Self {
            filename: Arc::new(RwLock::new(filename)),
            fetches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// A fetcher whose downloads produce `path`.
    pub fn returning(path: impl Into<PathBuf>) -> Self {
        Self::with_filename(Some(path.into()))
    }

    /// A fetcher whose metadata never names a file.
    pub fn without_filename() -> Self {
        Self::with_filename(None)
    }

    pub async fn set_filename(&self, path: Option<PathBuf>) {
        *self.filename.write().await = path;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated download duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<String> {
        self.fetches.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        id: &str,
        _max_retries: u32,
        progress: &ProgressReporter,
    ) -> Result<FetchedMedia, FetchError> {
        let media_id = MediaId::parse(id)?;
        self.fetches.write().await.push(id.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let mut record = Map::new();
        record.insert("id".to_string(), Value::String(media_id.to_string()));
        if let Some(path) = self.filename.read().await.as_ref() {
            record.insert(
                "_filename".to_string(),
                Value::String(path.to_string_lossy().to_string()),
            );
        }

        progress.report("Downloading video...");
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(FetchedMedia::new(
            FetchMetadata::from(record),
            Path::new(""),
            1,
        ))
    }
}
