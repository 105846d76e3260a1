//! Telegram transport: a Bot API client and its wire types.

mod client;
mod types;

pub use client::TelegramClient;
pub use types::{ApiResponse, Chat, Message, Update, User};
