//! Error types for chat transports.

use thiserror::Error;

/// Errors returned by a [`ChatTransport`](super::ChatTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("Transport request failed: {0}")]
    Http(String),

    /// The chat service rejected the request.
    #[error("Chat API error {code:?}: {description}")]
    Api {
        code: Option<i32>,
        description: String,
    },

    /// The response could not be decoded.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn api(code: Option<i32>, description: impl Into<String>) -> Self {
        Self::Api {
            code,
            description: description.into(),
        }
    }
}
