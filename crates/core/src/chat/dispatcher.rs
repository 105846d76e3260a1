//! Routes incoming chat text to replies and jobs.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::TransportError;
use super::sink::StatusMessageSink;
use super::traits::{ChatTransport, JobSubmitter};
use super::types::IncomingMessage;
use crate::auth::Authorizer;
use crate::encoder::EncodeStrategy;
use crate::media_id::extract_media_id;
use crate::pipeline::{JobHandle, JobRequest, STATUS_HEADER};

const GREETING: &str = "Hi!";
const NOT_UNDERSTOOD: &str = "Sorry, what?";
const SHUTTING_DOWN: &str = "Sorry, I'm shutting down and can't take new videos.";

/// What the dispatcher did with a message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Sender is not on the allow list.
    Refused,
    /// Answered `/start`.
    Greeted,
    /// Any other command; no reply.
    IgnoredCommand,
    /// A job was submitted; its status message is being edited.
    Accepted(JobHandle),
    /// A link was found but the pipeline is no longer accepting jobs.
    Unavailable,
    /// Nothing actionable in the text.
    NotUnderstood,
}

fn refusal(first_name: &str) -> String {
    format!("Sorry, {first_name}. I'm not allowed to talk to strangers.")
}

/// Entry point for inbound text.
pub struct MessageDispatcher {
    transport: Arc<dyn ChatTransport>,
    authorizer: Arc<dyn Authorizer>,
    jobs: Arc<dyn JobSubmitter>,
    strategy: EncodeStrategy,
}

impl MessageDispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        authorizer: Arc<dyn Authorizer>,
        jobs: Arc<dyn JobSubmitter>,
        strategy: EncodeStrategy,
    ) -> Self {
        Self {
            transport,
            authorizer,
            jobs,
            strategy,
        }
    }

    /// Handles one text message.
    ///
    /// Authorization is checked before anything else. Transport errors are
    /// returned; a job that was already submitted keeps running regardless.
    pub async fn handle_incoming_text(
        &self,
        message: &IncomingMessage,
    ) -> Result<DispatchOutcome, TransportError> {
        let chat_id = message.chat_id;

        if !self.authorizer.is_authorized(message.from.id) {
            warn!(
                user_id = message.from.id,
                name = %message.from.first_name,
                "Message from unauthorized user"
            );
            self.transport
                .send_message(chat_id, &refusal(&message.from.first_name), None)
                .await?;
            return Ok(DispatchOutcome::Refused);
        }

        if let Some(command) = message.command() {
            if command == "start" {
                self.transport.send_message(chat_id, GREETING, None).await?;
                return Ok(DispatchOutcome::Greeted);
            }
            debug!(command, "Ignoring command");
            return Ok(DispatchOutcome::IgnoredCommand);
        }

        let Some(media_id) = extract_media_id(&message.text) else {
            self.transport
                .send_message(chat_id, NOT_UNDERSTOOD, None)
                .await?;
            return Ok(DispatchOutcome::NotUnderstood);
        };

        let status = self
            .transport
            .send_message(chat_id, STATUS_HEADER, Some(message.message_id))
            .await?;
        let sink = Arc::new(StatusMessageSink::new(Arc::clone(&self.transport), status));
        let request = JobRequest::new(media_id.as_str(), self.strategy);

        match self.jobs.submit_job(request, sink).await {
            Ok(handle) => {
                info!(
                    job_id = %handle.id(),
                    media_id = %media_id,
                    user_id = message.from.id,
                    "Accepted job from chat"
                );
                Ok(DispatchOutcome::Accepted(handle))
            }
            Err(e) => {
                warn!(media_id = %media_id, error = %e, "Job not accepted");
                self.transport.edit_message(status, SHUTTING_DOWN).await?;
                Ok(DispatchOutcome::Unavailable)
            }
        }
    }
}
