//! Chat message types.

use serde::{Deserialize, Serialize};

/// Address of one sent message, used to edit it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Who sent an incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: i64,
    pub first_name: String,
}

/// A text message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub from: ChatUser,
    pub text: String,
}

impl IncomingMessage {
    pub fn handle(&self) -> MessageHandle {
        MessageHandle {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }

    /// The command name when the text is a bot command, without the leading
    /// slash or any `@botname` suffix.
    pub fn command(&self) -> Option<&str> {
        let rest = self.text.strip_prefix('/')?;
        let name = rest.split(char::is_whitespace).next().unwrap_or(rest);
        Some(name.split('@').next().unwrap_or(name))
    }
}
