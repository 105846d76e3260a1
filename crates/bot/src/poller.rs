//! Long-poll loop feeding Telegram updates to the dispatcher.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tuberecode_core::{DispatchOutcome, MessageDispatcher, TransportError};

use crate::metrics::DISPATCH_OUTCOMES;
use crate::telegram::TelegramClient;

/// Pause after a failed poll.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

fn outcome_label(outcome: &DispatchOutcome) -> &'static str {
    match outcome {
        DispatchOutcome::Refused => "refused",
        DispatchOutcome::Greeted => "greeted",
        DispatchOutcome::IgnoredCommand => "ignored_command",
        DispatchOutcome::Accepted(_) => "accepted",
        DispatchOutcome::Unavailable => "unavailable",
        DispatchOutcome::NotUnderstood => "not_understood",
    }
}

/// Fetches updates and hands each text message to the dispatcher.
pub struct Poller {
    client: Arc<TelegramClient>,
    dispatcher: Arc<MessageDispatcher>,
    poll_timeout_secs: u32,
    backoff: Duration,
    offset: Option<i64>,
}

impl Poller {
    pub fn new(
        client: Arc<TelegramClient>,
        dispatcher: Arc<MessageDispatcher>,
        poll_timeout_secs: u32,
    ) -> Self {
        Self {
            client,
            dispatcher,
            poll_timeout_secs,
            backoff: ERROR_BACKOFF,
            offset: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Next update id to request.
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetches one batch of updates and dispatches them in order.
    ///
    /// Returns the number of updates consumed. The offset advances past every
    /// update, including ones that were not text or failed to dispatch.
    pub async fn poll_once(&mut self) -> Result<usize, TransportError> {
        let updates = self
            .client
            .get_updates(self.offset, self.poll_timeout_secs)
            .await?;
        let count = updates.len();

        for update in updates {
            self.offset = Some(update.update_id + 1);

            let Some(message) = update.message.and_then(|m| m.into_incoming()) else {
                debug!(update_id = update.update_id, "Skipping non-text update");
                continue;
            };

            match self.dispatcher.handle_incoming_text(&message).await {
                Ok(outcome) => {
                    debug!(update_id = update.update_id, outcome = outcome_label(&outcome), "Dispatched");
                    DISPATCH_OUTCOMES
                        .with_label_values(&[outcome_label(&outcome)])
                        .inc();
                }
                Err(e) => {
                    warn!(update_id = update.update_id, error = %e, "Failed to answer message");
                    DISPATCH_OUTCOMES.with_label_values(&["error"]).inc();
                }
            }
        }

        Ok(count)
    }

    /// Polls until `shutdown` turns true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Polling for Telegram updates");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                result = self.poll_once() => {
                    if let Err(e) = result {
                        warn!(error = %e, backoff = ?self.backoff, "Polling failed");
                        tokio::select! {
                            _ = shutdown.changed() => {}
                            _ = tokio::time::sleep(self.backoff) => {}
                        }
                    }
                }
            }
        }

        info!("Poller stopped");
    }
}
