//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the fetcher, encoder, status
//! sink and chat transport, so the pipeline and dispatcher can be exercised
//! without youtube-dl, ffmpeg or a chat service.
//!
//! # Example
//!
//! ```rust,ignore
//! use tuberecode_core::testing::{MockEncoder, MockFetcher, RecordingSink};
//!
//! let fetcher = MockFetcher::returning("/downloads/clip.mkv");
//! let encoder = MockEncoder::new();
//! encoder.set_fail_on(Some(EncodePass::First)).await;
//!
//! let pipeline = Pipeline::new(PipelineConfig::default(), fetcher, encoder);
//! let report = pipeline.run(request, Arc::new(RecordingSink::new())).await?;
//! ```

mod mock_encoder;
mod mock_fetcher;
mod mock_transport;
mod recording_sink;

pub use mock_encoder::{EncodeEvent, MockEncoder};
pub use mock_fetcher::MockFetcher;
pub use mock_transport::{MockTransport, SentMessage};
pub use recording_sink::RecordingSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::chat::{ChatUser, IncomingMessage};

    /// A text message from `user_id` in their private chat.
    pub fn incoming_text(user_id: i64, first_name: &str, text: &str) -> IncomingMessage {
        IncomingMessage {
            chat_id: user_id,
            message_id: 10,
            from: ChatUser {
                id: user_id,
                first_name: first_name.to_string(),
            },
            text: text.to_string(),
        }
    }

    /// The metadata line youtube-dl prints for a download to `filename`.
    pub fn metadata_line(id: &str, filename: &str) -> String {
        serde_json::json!({
            "id": id,
            "title": format!("Video {id}"),
            "ext": Path::new(filename)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("mp4"),
            "_filename": filename,
        })
        .to_string()
    }

    /// Minimal valid configuration file.
    pub fn config_toml() -> &'static str {
        r#"
[telegram]
token = "123456:test-token"

[access]
authorized_users = [42]
"#
    }

    /// Creates an empty file, standing in for a finished download.
    pub fn touch(path: &Path) -> std::io::Result<()> {
        std::fs::write(path, b"")
    }
}
