//! Mock chat transport for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chat::{ChatTransport, MessageHandle, TransportError};

/// A message sent through the mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub handle: MessageHandle,
    pub text: String,
    pub reply_to: Option<i64>,
}

/// Mock implementation of the ChatTransport trait.
///
/// Every sent message gets a fresh message id. Sends and edits are recorded
/// for assertions.
#[derive(Debug, Clone)]
pub struct MockTransport {
    messages: Arc<RwLock<Vec<SentMessage>>>,
    edits: Arc<RwLock<Vec<(MessageHandle, String)>>>,
    next_error: Arc<RwLock<Option<TransportError>>>,
    next_message_id: Arc<AtomicI64>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            edits: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            next_message_id: Arc::new(AtomicI64::new(1000)),
        }
    }

    /// Configure the next send or edit to fail with the given error.
    pub async fn set_next_error(&self, error: TransportError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_messages(&self) -> Vec<SentMessage> {
        self.messages.read().await.clone()
    }

    pub async fn recorded_edits(&self) -> Vec<(MessageHandle, String)> {
        self.edits.read().await.clone()
    }

    /// Latest text of a message, taking edits into account.
    pub async fn current_text(&self, handle: MessageHandle) -> Option<String> {
        let edited = self
            .edits
            .read()
            .await
            .iter()
            .rev()
            .find(|(h, _)| *h == handle)
            .map(|(_, text)| text.clone());
        if edited.is_some() {
            return edited;
        }
        self.messages
            .read()
            .await
            .iter()
            .find(|m| m.handle == handle)
            .map(|m| m.text.clone())
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageHandle, TransportError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let handle = MessageHandle {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        };
        self.messages.write().await.push(SentMessage {
            handle,
            text: text.to_string(),
            reply_to,
        });
        Ok(handle)
    }

    async fn edit_message(&self, handle: MessageHandle, text: &str) -> Result<(), TransportError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.edits.write().await.push((handle, text.to_string()));
        Ok(())
    }
}
