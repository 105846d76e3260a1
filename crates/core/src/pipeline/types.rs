//! Types for the pipeline orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::encoder::{EncodePass, EncodeStrategy, GateStatus, TranscodeError, Transcoded};
use crate::fetcher::FetchError;
use crate::progress::ProgressLog;

/// Header of every job's status message.
pub const STATUS_HEADER: &str = "Downloading information...";

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The pipeline has been shut down and accepts no new jobs.
    #[error("Pipeline is shutting down")]
    ShuttingDown,

    /// The job's task ended without producing a report.
    #[error("Job task failed: {0}")]
    TaskFailed(String),
}

/// A request to fetch and transcode one media asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Raw identifier; validated by the fetch stage.
    pub identifier: String,
    pub strategy: EncodeStrategy,
}

impl JobRequest {
    pub fn new(identifier: impl Into<String>, strategy: EncodeStrategy) -> Self {
        Self {
            identifier: identifier.into(),
            strategy,
        }
    }
}

/// One fetch+transcode job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub identifier: String,
    pub strategy: EncodeStrategy,
    pub created_at: DateTime<Utc>,
    /// Set once the fetch reports a filename.
    pub resolved_path: Option<PathBuf>,
}

impl Job {
    pub(crate) fn new(request: &JobRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: request.identifier.clone(),
            strategy: request.strategy,
            created_at: Utc::now(),
            resolved_path: None,
        }
    }
}

/// Where a live job currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobPhase {
    Fetching,
    /// Waiting for an encoder slot.
    Queued,
    Encoding { pass: EncodePass },
}

/// Terminal result of a job.
#[derive(Debug)]
pub enum JobOutcome {
    Transcoded(Transcoded),
    /// The fetch reported no filename, so there was nothing to encode.
    Skipped,
    FetchFailed(FetchError),
    TranscodeFailed(TranscodeError),
    /// The job's task panicked. Any encoder slot it held was released.
    Crashed(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Transcoded(_) | Self::Skipped)
    }

    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transcoded(_) => "transcoded",
            Self::Skipped => "skipped",
            Self::FetchFailed(_) => "fetch_failed",
            Self::TranscodeFailed(_) => "transcode_failed",
            Self::Crashed(_) => "crashed",
        }
    }
}

/// Everything known about a job once it has finished.
#[derive(Debug)]
pub struct JobReport {
    pub job: Job,
    pub outcome: JobOutcome,
    pub log: ProgressLog,
}

/// A live job as shown on the status board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    #[serde(flatten)]
    pub job: Job,
    pub phase: JobPhase,
}

/// Current state of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub accepting: bool,
    pub encoders: GateStatus,
    pub jobs: Vec<JobSnapshot>,
}
