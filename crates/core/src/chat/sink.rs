//! Status sink backed by one chat message.

use async_trait::async_trait;
use std::sync::Arc;

use super::traits::ChatTransport;
use super::types::MessageHandle;
use crate::progress::{SinkError, StatusSink};

/// Delivers progress by editing a single status message in place.
pub struct StatusMessageSink {
    transport: Arc<dyn ChatTransport>,
    handle: MessageHandle,
}

impl StatusMessageSink {
    pub fn new(transport: Arc<dyn ChatTransport>, handle: MessageHandle) -> Self {
        Self { transport, handle }
    }

    pub fn handle(&self) -> MessageHandle {
        self.handle
    }
}

#[async_trait]
impl StatusSink for StatusMessageSink {
    async fn update(&self, text: &str) -> Result<(), SinkError> {
        self.transport
            .edit_message(self.handle, text)
            .await
            .map_err(|e| SinkError::Delivery(e.to_string()))
    }
}
