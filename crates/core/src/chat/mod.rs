//! Chat dispatch.
//!
//! The [`MessageDispatcher`] decides what to do with each incoming message and
//! hands accepted links to the pipeline. Progress flows back through a
//! [`StatusMessageSink`], which keeps editing the status message it replied with.

mod dispatcher;
mod error;
mod sink;
mod traits;
mod types;

pub use dispatcher::{DispatchOutcome, MessageDispatcher};
pub use error::TransportError;
pub use sink::StatusMessageSink;
pub use traits::{ChatTransport, JobSubmitter};
pub use types::{ChatUser, IncomingMessage, MessageHandle};
