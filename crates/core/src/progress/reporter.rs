use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::log::{ProgressEntry, ProgressLog};
use crate::metrics;

/// Error returned by a status sink. Never fatal to a job.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Status delivery failed: {0}")]
    Delivery(String),
}

/// Destination for rendered progress, owned by the chat transport.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Replaces the visible status with `text`.
    async fn update(&self, text: &str) -> Result<(), SinkError>;
}

/// Single-writer handle for one job's progress.
///
/// Dropping the reporter (or calling [`finish`](Self::finish)) closes the
/// channel; the delivery task flushes what is queued and exits.
pub struct ProgressReporter {
    started: Instant,
    tx: mpsc::UnboundedSender<ProgressEntry>,
    delivery: JoinHandle<ProgressLog>,
}

impl ProgressReporter {
    /// Starts a reporter whose clock begins now. Must be called within a Tokio runtime.
    pub fn new(header: impl Into<String>, sink: Arc<dyn StatusSink>) -> Self {
        Self::started_at(Instant::now(), header, sink)
    }

    /// Starts a reporter whose elapsed times are measured from `started`.
    pub fn started_at(started: Instant, header: impl Into<String>, sink: Arc<dyn StatusSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let delivery = tokio::spawn(deliver(ProgressLog::new(header), rx, sink));
        Self {
            started,
            tx,
            delivery,
        }
    }

    /// Appends a status line. Returns immediately.
    pub fn report(&self, message: impl Into<String>) {
        let entry = ProgressEntry::new(self.started.elapsed(), message);
        debug!(elapsed = ?entry.elapsed, message = %entry.message.trim_end(), "progress");
        if self.tx.send(entry).is_err() {
            warn!("Progress delivery task is gone, dropping status line");
        }
    }

    /// When the job's clock started.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Closes the reporter, waits for the last rendering to be delivered and
    /// returns the full log.
    pub async fn finish(self) -> ProgressLog {
        let Self { tx, delivery, .. } = self;
        drop(tx);
        match delivery.await {
            Ok(log) => log,
            Err(e) => {
                warn!(error = %e, "Progress delivery task failed");
                ProgressLog::default()
            }
        }
    }
}

async fn deliver(
    mut log: ProgressLog,
    mut rx: mpsc::UnboundedReceiver<ProgressEntry>,
    sink: Arc<dyn StatusSink>,
) -> ProgressLog {
    while let Some(entry) = rx.recv().await {
        log.push(entry);
        // Fold in lines queued while the previous update was in flight.
        while let Ok(entry) = rx.try_recv() {
            log.push(entry);
        }

        if let Err(e) = sink.update(&log.render()).await {
            metrics::STATUS_SINK_FAILURES.inc();
            warn!(error = %e, "Failed to push status update");
        }
    }
    log
}
