pub mod auth;
pub mod chat;
pub mod config;
pub mod encoder;
pub mod fetcher;
pub mod media_id;
pub mod metrics;
pub mod pipeline;
mod process;
pub mod progress;
pub mod testing;

pub use auth::{create_authorizer, AllowList, AuthError, Authorizer};
pub use chat::{
    ChatTransport, ChatUser, DispatchOutcome, IncomingMessage, JobSubmitter, MessageDispatcher,
    MessageHandle, StatusMessageSink, TransportError,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, AccessConfig,
    Config, ConfigError, HttpConfig, LogFormat, SanitizedConfig, TelegramConfig,
};
pub use encoder::{
    EncodePass, EncodeRequest, EncodeStrategy, Encoder, EncoderConfig, EncoderGate, FfmpegEncoder,
    GateStatus, TranscodeError, TranscodeStage, Transcoded,
};
pub use fetcher::{FetchError, FetchMetadata, FetchedMedia, Fetcher, FetcherConfig, YtdlFetcher};
pub use media_id::{extract_media_id, InvalidMediaId, MediaId};
pub use pipeline::{
    Job, JobHandle, JobOutcome, JobPhase, JobReport, JobRequest, JobSnapshot, Pipeline,
    PipelineConfig, PipelineError, PipelineStatus,
};
pub use progress::{ProgressLog, ProgressReporter, SinkError, StatusSink};
