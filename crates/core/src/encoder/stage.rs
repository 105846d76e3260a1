//! Admission and pass sequencing for one transcode.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::TranscodeError;
use super::gate::{EncoderGate, EncoderPermit};
use super::traits::Encoder;
use super::types::{output_path, EncodePass, EncodeRequest, EncodeStrategy, Transcoded};
use crate::metrics;
use crate::pipeline::JobPhase;
use crate::progress::ProgressReporter;

/// Container some fetch tools remux into while still reporting the original name.
const REMUX_EXTENSION: &str = "mkv";

/// Finds the file a fetch actually produced.
///
/// Returns `reported` when it exists. Otherwise, if it has a three-character
/// extension, tries the same path with the remux container's extension.
pub async fn resolve_source(reported: &Path) -> Option<PathBuf> {
    if exists(reported).await {
        return Some(reported.to_path_buf());
    }

    let ext = reported.extension()?.to_str()?;
    if ext.chars().count() != 3 || ext == REMUX_EXTENSION {
        return None;
    }

    let candidate = reported.with_extension(REMUX_EXTENSION);
    exists(&candidate).await.then_some(candidate)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Runs a strategy's passes behind the shared [`EncoderGate`].
pub struct TranscodeStage<E: Encoder> {
    encoder: Arc<E>,
    gate: EncoderGate,
    output_suffix: String,
}

impl<E: Encoder> TranscodeStage<E> {
    pub fn new(encoder: Arc<E>, gate: EncoderGate, output_suffix: impl Into<String>) -> Self {
        Self {
            encoder,
            gate,
            output_suffix: output_suffix.into(),
        }
    }

    pub fn gate(&self) -> &EncoderGate {
        &self.gate
    }

    pub fn encoder(&self) -> &Arc<E> {
        &self.encoder
    }

    /// Transcodes `source` with `strategy`.
    ///
    /// A missing source fails before the gate is touched. The encoder slot is
    /// released before this returns, whatever the outcome.
    pub async fn run(
        &self,
        source: &Path,
        strategy: EncodeStrategy,
        progress: &ProgressReporter,
        phase: &watch::Sender<JobPhase>,
    ) -> Result<Transcoded, TranscodeError> {
        let input = resolve_source(source)
            .await
            .ok_or_else(|| TranscodeError::FileNotFound {
                path: source.to_path_buf(),
            })?;
        if input != source {
            info!(
                reported = %source.display(),
                actual = %input.display(),
                "Using remuxed file"
            );
        }
        let output = output_path(&input, &self.output_suffix);

        let (permit, queued) = self.admit(progress, phase).await?;
        let started = Instant::now();
        let result = self
            .run_passes(&input, &output, strategy, progress, phase)
            .await;
        drop(permit);

        let elapsed = started.elapsed();
        metrics::ENCODE_DURATION
            .with_label_values(&[strategy.as_str()])
            .observe(elapsed.as_secs_f64());
        let label = match &result {
            Ok(()) => "success",
            Err(e) => e.kind(),
        };
        metrics::ENCODES_TOTAL
            .with_label_values(&[strategy.as_str(), label])
            .inc();

        result.map(|()| Transcoded {
            input,
            output,
            strategy,
            queued,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    /// Takes a slot immediately if possible; otherwise reports the wait and blocks.
    async fn admit(
        &self,
        progress: &ProgressReporter,
        phase: &watch::Sender<JobPhase>,
    ) -> Result<(EncoderPermit, bool), TranscodeError> {
        if let Some(permit) = self.gate.try_acquire() {
            return Ok((permit, false));
        }

        phase.send_replace(JobPhase::Queued);
        progress.report("Encoders are busy. Queued...");
        debug!(status = ?self.gate.status(), "Waiting for encoder slot");
        let permit = self.gate.acquire().await?;
        Ok((permit, true))
    }

    async fn run_passes(
        &self,
        input: &Path,
        output: &Path,
        strategy: EncodeStrategy,
        progress: &ProgressReporter,
        phase: &watch::Sender<JobPhase>,
    ) -> Result<(), TranscodeError> {
        for &pass in strategy.passes() {
            phase.send_replace(JobPhase::Encoding { pass });
            progress.report(pass.start_message());

            let request = EncodeRequest {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                pass,
            };
            if let Err(e) = self.encoder.encode(&request).await {
                warn!(pass = %pass, error = %e, encoder = self.encoder.name(), "Encode pass failed");
                return Err(e);
            }
            if pass == EncodePass::First {
                debug!(input = %input.display(), "First pass complete");
            }
        }
        Ok(())
    }
}
