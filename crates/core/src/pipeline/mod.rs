//! Pipeline orchestrator.
//!
//! [`Pipeline::submit`] accepts a job and returns immediately; the fetch,
//! admission and transcode steps run on a background task, and every step
//! reports through the job's [`ProgressReporter`](crate::progress::ProgressReporter).
//! A job that fails to fetch, or fetches nothing to encode, never touches the
//! encoder gate.

mod config;
mod orchestrator;
mod types;

pub use config::PipelineConfig;
pub use orchestrator::{JobHandle, Pipeline};
pub use types::{
    Job, JobOutcome, JobPhase, JobReport, JobRequest, JobSnapshot, PipelineError, PipelineStatus,
    STATUS_HEADER,
};
