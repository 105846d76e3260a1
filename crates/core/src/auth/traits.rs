use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Decides whether a chat user may submit jobs.
pub trait Authorizer: Send + Sync {
    /// Whether the given Telegram user id is allowed to use the bot
    fn is_authorized(&self, user_id: i64) -> bool;

    /// Name of this authorization method
    fn method_name(&self) -> &'static str;
}
