//! Configuration for the fetch stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the youtube-dl compatible fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the fetch tool binary.
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Arguments placed before everything else (e.g. `["-m", "yt_dlp"]` with `python3`).
    #[serde(default)]
    pub base_args: Vec<String>,

    /// Format selector passed with `-f`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Account name for authenticated fetches.
    #[serde(default)]
    pub username: Option<String>,

    /// Account password for authenticated fetches.
    #[serde(default)]
    pub password: Option<String>,

    /// Ask the site to mark videos as watched (authenticated fetches only).
    #[serde(default = "default_true")]
    pub mark_watched: bool,

    /// Retries after a stalled download.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How long a download may run before it is considered stalled.
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_secs: u64,

    /// How long to wait for the metadata line.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// Working directory of the fetch tool; relative filenames resolve against it.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_program() -> PathBuf {
    PathBuf::from("youtube-dl")
}

fn default_format() -> String {
    "bestvideo[height<=1080]+bestaudio".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    5
}

fn default_stall_timeout() -> u64 {
    120
}

fn default_metadata_timeout() -> u64 {
    60
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            base_args: Vec::new(),
            format: default_format(),
            username: None,
            password: None,
            mark_watched: default_true(),
            max_retries: default_max_retries(),
            stall_timeout_secs: default_stall_timeout(),
            metadata_timeout_secs: default_metadata_timeout(),
            download_dir: default_download_dir(),
        }
    }
}

impl FetcherConfig {
    /// Creates a config that runs `program` with leading `base_args`.
    pub fn with_program(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            ..Default::default()
        }
    }

    /// Sets account credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the download directory.
    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = dir;
        self
    }

    /// Account pair, if both halves are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}
