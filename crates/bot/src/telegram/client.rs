//! Telegram Bot API client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use tuberecode_core::{ChatTransport, MessageHandle, TelegramConfig, TransportError};

use super::types::{
    ApiResponse, EditMessageTextParams, GetUpdatesParams, Message, SendMessageParams, Update, User,
};
use crate::metrics;

/// Minimal Bot API client: long polling plus sending and editing text.
pub struct TelegramClient {
    http: reqwest::Client,
    /// `{api_url}/bot{token}`; never logged.
    base_url: String,
}

impl TelegramClient {
    /// Creates a client with the given configuration.
    pub fn new(config: &TelegramConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs as u64))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token
            ),
        })
    }

    async fn call<P, R>(&self, method: &'static str, params: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let result = self.call_inner(method, params).await;
        if result.is_err() {
            metrics::TELEGRAM_API_ERRORS
                .with_label_values(&[method])
                .inc();
        }
        result
    }

    async fn call_inner<P, R>(&self, method: &str, params: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(params)
            .send()
            .await
            // without_url keeps the token out of error messages
            .map_err(|e| TransportError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body: ApiResponse<R> = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(format!("{method} ({status}): {}", e.without_url())))?;

        if !body.ok {
            return Err(TransportError::api(
                body.error_code,
                body.description.unwrap_or_else(|| status.to_string()),
            ));
        }
        body.result
            .ok_or_else(|| TransportError::Decode(format!("{method}: missing result")))
    }

    /// Returns the bot's own account; used as a startup check.
    pub async fn get_me(&self) -> Result<User, TransportError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-polls for new messages.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, TransportError> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &params).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Message, TransportError> {
        let params = SendMessageParams {
            chat_id,
            text,
            reply_to_message_id: reply_to,
        };
        self.call("sendMessage", &params).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        let params = EditMessageTextParams {
            chat_id,
            message_id,
            text,
        };
        // The result is the edited message, or `true` for inline messages.
        let _: serde_json::Value = self.call("editMessageText", &params).await?;
        debug!(chat_id, message_id, "Edited status message");
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<MessageHandle, TransportError> {
        let message = TelegramClient::send_message(self, chat_id, text, reply_to).await?;
        Ok(MessageHandle {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit_message(&self, handle: MessageHandle, text: &str) -> Result<(), TransportError> {
        self.edit_message_text(handle.chat_id, handle.message_id, text)
            .await
    }
}
