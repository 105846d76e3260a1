//! Fetch stage: runs a youtube-dl compatible tool and waits for the download.
//!
//! The tool is started with `--print-json`, so its first stdout line is a JSON
//! metadata record (including `_filename`). After that line the stage waits for
//! the process to exit; a download that outlives the stall timeout is
//! terminated and retried a bounded number of times.

mod config;
mod error;
mod traits;
mod types;
mod ytdl;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::Fetcher;
pub use types::{FetchMetadata, FetchedMedia};
pub use ytdl::YtdlFetcher;
