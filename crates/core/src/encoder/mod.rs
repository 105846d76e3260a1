//! Encoder module - admission gate and FFmpeg-backed transcoding.
//!
//! A transcode resolves the downloaded file, waits for a slot on the
//! process-wide [`EncoderGate`], then runs the passes of an
//! [`EncodeStrategy`] through an [`Encoder`].

mod config;
mod error;
mod ffmpeg;
mod gate;
mod stage;
mod traits;
mod types;

pub use config::EncoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegEncoder;
pub use gate::{EncoderGate, EncoderPermit, GateStatus};
pub use stage::{resolve_source, TranscodeStage};
pub use traits::Encoder;
pub use types::{output_path, EncodePass, EncodeRequest, EncodeStrategy, Transcoded};
