//! Per-job progress reporting.
//!
//! Stages call [`ProgressReporter::report`] with short status lines. Each line
//! is stamped with the time elapsed since the job started and queued on a
//! channel owned by the job; a delivery task appends it to the job's
//! [`ProgressLog`], renders the whole log and pushes it to a [`StatusSink`]
//! (typically "edit the status message in the chat").
//!
//! Reporting never blocks on the sink. A slow sink sees coalesced renderings,
//! a failing sink is logged and ignored.

mod log;
mod reporter;

pub use log::{ProgressEntry, ProgressLog};
pub use reporter::{ProgressReporter, SinkError, StatusSink};
