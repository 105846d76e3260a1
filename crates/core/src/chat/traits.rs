//! Trait definitions for chat dispatch.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::TransportError;
use super::types::MessageHandle;
use crate::pipeline::{JobHandle, JobRequest, PipelineError};
use crate::progress::StatusSink;

/// Outbound side of a chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends `text` to `chat_id`, optionally as a reply to `reply_to`.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageHandle, TransportError>;

    /// Replaces the text of a previously sent message.
    async fn edit_message(&self, handle: MessageHandle, text: &str) -> Result<(), TransportError>;
}

/// Accepts jobs from the dispatcher.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit_job(
        &self,
        request: JobRequest,
        sink: Arc<dyn StatusSink>,
    ) -> Result<JobHandle, PipelineError>;
}
