//! youtube-dl / yt-dlp backed fetcher.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::Fetcher;
use super::types::{FetchMetadata, FetchedMedia};
use crate::media_id::MediaId;
use crate::metrics;
use crate::process::{terminate, StderrTail, TERMINATE_GRACE};
use crate::progress::ProgressReporter;

/// Result of a single run of the tool.
enum Attempt {
    Completed(FetchMetadata),
    Stalled,
}

/// Fetcher that shells out to a youtube-dl compatible executable.
pub struct YtdlFetcher {
    config: FetcherConfig,
    metadata_timeout: Duration,
    stall_timeout: Duration,
    terminate_grace: Duration,
}

impl YtdlFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        let metadata_timeout = Duration::from_secs(config.metadata_timeout_secs);
        let stall_timeout = Duration::from_secs(config.stall_timeout_secs);
        Self {
            config,
            metadata_timeout,
            stall_timeout,
            terminate_grace: TERMINATE_GRACE,
        }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    /// Overrides the metadata and stall timeouts with sub-second precision.
    pub fn with_timeouts(mut self, metadata: Duration, stall: Duration) -> Self {
        self.metadata_timeout = metadata;
        self.stall_timeout = stall;
        self
    }

    /// Overrides how long a terminated tool gets before it is killed.
    pub fn with_terminate_grace(mut self, grace: Duration) -> Self {
        self.terminate_grace = grace;
        self
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Builds the tool's argument list. The id always follows `--`.
    fn build_args(&self, id: &MediaId) -> Vec<String> {
        let mut args = self.config.base_args.clone();
        args.extend([
            "--print-json".to_string(),
            "-f".to_string(),
            self.config.format.clone(),
        ]);

        if let Some((user, pass)) = self.config.credentials() {
            args.extend([
                "-u".to_string(),
                user.to_string(),
                "-p".to_string(),
                pass.to_string(),
            ]);
            if self.config.mark_watched {
                args.push("--mark-watched".to_string());
            }
        }

        args.push("--".to_string());
        args.push(id.as_str().to_string());
        args
    }

    fn spawn(&self, id: &MediaId) -> Result<Child, FetchError> {
        Command::new(&self.config.program)
            .args(self.build_args(id))
            .current_dir(&self.config.download_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::ToolUnavailable {
                        program: self.config.program.clone(),
                    }
                } else {
                    FetchError::Io(e)
                }
            })
    }

    /// Runs the tool once: read the metadata line, then wait for exit.
    async fn attempt(
        &self,
        id: &MediaId,
        progress: &ProgressReporter,
    ) -> Result<Attempt, FetchError> {
        let mut child = self.spawn(id)?;
        let stderr = child.stderr.take().map(StderrTail::spawn);
        let Some(stdout) = child.stdout.take() else {
            terminate(&mut child, self.terminate_grace).await;
            return Err(FetchError::Io(std::io::Error::other("stdout was not captured")));
        };
        let mut lines = BufReader::new(stdout).lines();

        let line = match timeout(self.metadata_timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) if !line.trim().is_empty() => line,
            Ok(Ok(_)) | Err(_) => {
                terminate(&mut child, self.terminate_grace).await;
                if let Some(stderr) = collect(stderr).await {
                    warn!(media_id = %id, stderr = %stderr, "Fetch tool printed no metadata");
                }
                return Err(FetchError::NoMetadata);
            }
            Ok(Err(e)) => {
                terminate(&mut child, self.terminate_grace).await;
                return Err(FetchError::Io(e));
            }
        };

        let metadata = match FetchMetadata::from_json_line(&line) {
            Ok(metadata) => metadata,
            Err(e) => {
                terminate(&mut child, self.terminate_grace).await;
                return Err(FetchError::MalformedMetadata {
                    reason: e.to_string(),
                });
            }
        };
        debug!(media_id = %id, filename = ?metadata.filename(), "Received metadata");

        // Anything after the metadata line is discarded so the tool never
        // blocks on a full pipe.
        let mut rest = lines.into_inner();
        tokio::spawn(async move {
            let _ = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await;
        });

        progress.report("Downloading video...");

        match timeout(self.stall_timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(Attempt::Completed(metadata)),
            Ok(Ok(status)) => Err(FetchError::ToolFailed {
                code: status.code(),
                stderr: collect(stderr).await,
            }),
            Ok(Err(e)) => Err(FetchError::Io(e)),
            Err(_) => {
                terminate(&mut child, self.terminate_grace).await;
                Ok(Attempt::Stalled)
            }
        }
    }
}

async fn collect(tail: Option<StderrTail>) -> Option<String> {
    match tail {
        Some(tail) => tail.collect().await,
        None => None,
    }
}

#[async_trait]
impl Fetcher for YtdlFetcher {
    fn name(&self) -> &str {
        "youtube-dl"
    }

    async fn fetch(
        &self,
        id: &str,
        max_retries: u32,
        progress: &ProgressReporter,
    ) -> Result<FetchedMedia, FetchError> {
        let media_id = MediaId::parse(id)?;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            info!(media_id = %media_id, attempt = attempts, "Starting fetch");

            let outcome = match self.attempt(&media_id, progress).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    metrics::FETCH_ATTEMPTS.with_label_values(&[e.kind()]).inc();
                    return Err(e);
                }
            };

            match outcome {
                Attempt::Completed(metadata) => {
                    metrics::FETCH_ATTEMPTS.with_label_values(&["completed"]).inc();
                    info!(media_id = %media_id, attempts, "Fetch completed");
                    return Ok(FetchedMedia::new(
                        metadata,
                        &self.config.download_dir,
                        attempts,
                    ));
                }
                Attempt::Stalled => {
                    metrics::FETCH_ATTEMPTS.with_label_values(&["stalled"]).inc();
                    warn!(
                        media_id = %media_id,
                        attempt = attempts,
                        timeout = ?self.stall_timeout,
                        "Download stalled, tool terminated"
                    );
                    if attempts > max_retries {
                        return Err(FetchError::Timeout { attempts });
                    }
                    metrics::FETCH_RETRIES.inc();
                    progress.report("Retrying...");
                }
            }
        }
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let output = Command::new(&self.config.program)
            .args(&self.config.base_args)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::ToolUnavailable {
                        program: self.config.program.clone(),
                    }
                } else {
                    FetchError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(FetchError::ToolFailed {
                code: output.status.code(),
                stderr: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            });
        }
        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "Fetch tool available"
        );
        Ok(())
    }
}
