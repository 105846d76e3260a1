//! Trait definitions for the encoder module.

use async_trait::async_trait;

use super::error::TranscodeError;
use super::types::EncodeRequest;

/// Runs one encoder invocation to completion.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Runs `request.pass` over `request.input`. Blocks until the tool exits.
    async fn encode(&self, request: &EncodeRequest) -> Result<(), TranscodeError>;

    /// Validates that the encoder is installed and runnable.
    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
