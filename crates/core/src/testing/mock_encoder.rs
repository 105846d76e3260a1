//! Mock encoder for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::encoder::{EncodePass, EncodeRequest, Encoder, TranscodeError};

/// Start or end of one encode, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeEvent {
    Started(EncodeRequest),
    Finished(EncodeRequest),
}

/// Decrements the running count even if the encode panics.
struct Running<'a>(&'a AtomicUsize);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock implementation of the Encoder trait.
///
/// Provides controllable behavior for testing:
/// - Record every pass and the order encodes start and finish
/// - Track the highest number of encodes running at once
/// - Fail or panic on a chosen pass
/// - Simulate encode duration
#[derive(Debug, Clone, Default)]
pub struct MockEncoder {
    events: Arc<RwLock<Vec<EncodeEvent>>>,
    fail_on: Arc<RwLock<Option<EncodePass>>>,
    panic_on: Arc<RwLock<Option<EncodePass>>>,
    delay: Arc<RwLock<Duration>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every encode of `pass` exit with a failure.
    pub async fn set_fail_on(&self, pass: Option<EncodePass>) {
        *self.fail_on.write().await = pass;
    }

    /// Make every encode of `pass` panic mid-run.
    pub async fn set_panic_on(&self, pass: Option<EncodePass>) {
        *self.panic_on.write().await = pass;
    }

    /// Set the simulated duration of each pass.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn recorded_events(&self) -> Vec<EncodeEvent> {
        self.events.read().await.clone()
    }

    /// Passes that were started, in order.
    pub async fn recorded_requests(&self) -> Vec<EncodeRequest> {
        self.events
            .read()
            .await
            .iter()
            .filter_map(|e| match e {
                EncodeEvent::Started(request) => Some(request.clone()),
                EncodeEvent::Finished(_) => None,
            })
            .collect()
    }

    /// Highest number of encodes observed running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    /// Encodes running right now.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<(), TranscodeError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        let _running = Running(&self.running);
        self.max_running.fetch_max(now, Ordering::SeqCst);
        self.events
            .write()
            .await
            .push(EncodeEvent::Started(request.clone()));

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.panic_on.read().await == Some(request.pass) {
            panic!("encoder crashed during {} pass", request.pass);
        }

        self.events
            .write()
            .await
            .push(EncodeEvent::Finished(request.clone()));

        if *self.fail_on.read().await == Some(request.pass) {
            return Err(TranscodeError::encode_failed(
                request.pass,
                Some(1),
                Some("mock failure".to_string()),
            ));
        }
        Ok(())
    }
}
