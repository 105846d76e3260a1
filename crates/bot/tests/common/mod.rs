//! Shared helpers for tests that talk to a fake Bot API.
//!
//! A [`wiremock::MockServer`] stands in for `api.telegram.org`; the helpers
//! below build the JSON it answers with.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tuberecode_core::TelegramConfig;

pub const TOKEN: &str = "123456:test-token";

/// Config pointing the client at the mock server.
pub fn telegram_config(server: &MockServer) -> TelegramConfig {
    TelegramConfig {
        token: TOKEN.to_string(),
        api_url: server.uri(),
        poll_timeout_secs: 0,
        request_timeout_secs: 5,
    }
}

/// Path of a Bot API method on the mock server.
pub fn api_path(api_method: &str) -> String {
    format!("/bot{TOKEN}/{api_method}")
}

pub fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": result }))
}

pub fn api_error(status: u16, description: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "ok": false,
        "error_code": status,
        "description": description,
    }))
}

pub fn user_json(id: i64, first_name: &str) -> Value {
    json!({ "id": id, "is_bot": false, "first_name": first_name })
}

pub fn message_json(message_id: i64, chat_id: i64, text: &str) -> Value {
    json!({
        "message_id": message_id,
        "chat": { "id": chat_id, "type": "private" },
        "date": 1700000000,
        "text": text,
    })
}

/// An update carrying a text message from `user_id` in their private chat.
pub fn text_update(update_id: i64, user_id: i64, first_name: &str, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id * 10,
            "from": user_json(user_id, first_name),
            "chat": { "id": user_id, "type": "private" },
            "date": 1700000000,
            "text": text,
        }
    })
}

/// An update with a photo and no text.
pub fn photo_update(update_id: i64, user_id: i64) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id * 10,
            "from": user_json(user_id, "Ann"),
            "chat": { "id": user_id, "type": "private" },
            "date": 1700000000,
            "photo": [{ "file_id": "abc", "width": 10, "height": 10 }],
        }
    })
}

/// Answers getMe with a bot account.
pub async fn mount_get_me(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(api_path("getMe")))
        .respond_with(ok(json!({
            "id": 999,
            "is_bot": true,
            "first_name": "Recoder",
            "username": "recoder_bot",
        })))
        .mount(server)
        .await;
}

/// Answers every sendMessage with a message in chat `chat_id`.
pub async fn mount_send_message(server: &MockServer, chat_id: i64) {
    Mock::given(method("POST"))
        .and(path(api_path("sendMessage")))
        .respond_with(ok(message_json(777, chat_id, "sent")))
        .mount(server)
        .await;
}

/// Answers every editMessageText.
pub async fn mount_edit_message(server: &MockServer, chat_id: i64) {
    Mock::given(method("POST"))
        .and(path(api_path("editMessageText")))
        .respond_with(ok(message_json(777, chat_id, "edited")))
        .mount(server)
        .await;
}

/// JSON bodies of every request the server received for `api_method`.
pub async fn request_bodies(server: &MockServer, api_method: &str) -> Vec<Value> {
    let wanted = api_path(api_method);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == wanted)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}
