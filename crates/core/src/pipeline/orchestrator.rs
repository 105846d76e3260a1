//! Pipeline orchestrator implementation.

use async_trait::async_trait;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::chat::JobSubmitter;
use crate::encoder::{Encoder, EncoderGate, TranscodeError, TranscodeStage};
use crate::fetcher::Fetcher;
use crate::metrics;
use crate::progress::{ProgressReporter, StatusSink};

use super::config::PipelineConfig;
use super::types::{
    Job, JobOutcome, JobPhase, JobReport, JobRequest, JobSnapshot, PipelineError, PipelineStatus,
    STATUS_HEADER,
};

/// A live job on the status board.
struct BoardEntry {
    job: Job,
    phase: watch::Receiver<JobPhase>,
}

type Board = Arc<RwLock<HashMap<Uuid, BoardEntry>>>;

/// Handle to a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    task: JoinHandle<JobReport>,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the job to reach a terminal state.
    pub async fn wait(self) -> Result<JobReport, PipelineError> {
        self.task
            .await
            .map_err(|e| PipelineError::TaskFailed(e.to_string()))
    }
}

/// Sequences fetch, admission and transcode for each submitted job.
pub struct Pipeline<F: Fetcher, E: Encoder> {
    config: PipelineConfig,
    fetcher: Arc<F>,
    stage: Arc<TranscodeStage<E>>,
    board: Board,
    accepting: Arc<AtomicBool>,
}

impl<F: Fetcher + 'static, E: Encoder + 'static> Pipeline<F, E> {
    /// Creates a pipeline with its own encoder gate.
    pub fn new(config: PipelineConfig, fetcher: F, encoder: E) -> Self {
        let gate = EncoderGate::new(config.parallel_encoders);
        Self::with_gate(config, Arc::new(fetcher), Arc::new(encoder), gate)
    }

    /// Creates a pipeline that shares an existing gate.
    pub fn with_gate(
        config: PipelineConfig,
        fetcher: Arc<F>,
        encoder: Arc<E>,
        gate: EncoderGate,
    ) -> Self {
        let stage = TranscodeStage::new(encoder, gate, config.output_suffix.clone());
        Self {
            config,
            fetcher,
            stage: Arc::new(stage),
            board: Arc::new(RwLock::new(HashMap::new())),
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn gate(&self) -> &EncoderGate {
        self.stage.gate()
    }

    pub fn fetcher(&self) -> &Arc<F> {
        &self.fetcher
    }

    pub fn encoder(&self) -> &Arc<E> {
        self.stage.encoder()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Accepts a job and runs it in the background.
    ///
    /// Progress, including the terminal line, is delivered through `sink`.
    pub async fn submit(
        &self,
        request: JobRequest,
        sink: Arc<dyn StatusSink>,
    ) -> Result<JobHandle, PipelineError> {
        if !self.is_accepting() {
            return Err(PipelineError::ShuttingDown);
        }

        let job = Job::new(&request);
        let id = job.id;
        let (phase_tx, phase_rx) = watch::channel(JobPhase::Fetching);
        self.board.write().await.insert(
            id,
            BoardEntry {
                job: job.clone(),
                phase: phase_rx,
            },
        );

        let reporter = ProgressReporter::new(STATUS_HEADER, sink);
        let ctx = JobContext {
            fetcher: Arc::clone(&self.fetcher),
            stage: Arc::clone(&self.stage),
            board: Arc::clone(&self.board),
            max_retries: self.config.max_retries,
        };

        info!(job_id = %id, identifier = %request.identifier, strategy = %request.strategy, "Job submitted");
        let span = tracing::info_span!("job", job_id = %id);
        let task = tokio::spawn(ctx.run(job, reporter, phase_tx).instrument(span));

        Ok(JobHandle { id, task })
    }

    /// Submits a job and waits for it to finish.
    pub async fn run(
        &self,
        request: JobRequest,
        sink: Arc<dyn StatusSink>,
    ) -> Result<JobReport, PipelineError> {
        self.submit(request, sink).await?.wait().await
    }

    /// Live jobs ordered by submission time, plus encoder occupancy.
    pub async fn status(&self) -> PipelineStatus {
        let board = self.board.read().await;
        let mut jobs: Vec<JobSnapshot> = board
            .values()
            .map(|entry| JobSnapshot {
                job: entry.job.clone(),
                phase: *entry.phase.borrow(),
            })
            .collect();
        jobs.sort_by_key(|s| s.job.created_at);

        PipelineStatus {
            accepting: self.is_accepting(),
            encoders: self.gate().status(),
            jobs,
        }
    }

    /// Number of jobs that have not yet reached a terminal state.
    pub async fn active_jobs(&self) -> usize {
        self.board.read().await.len()
    }

    /// Stops accepting jobs and closes the encoder gate.
    ///
    /// Jobs waiting for a slot finish with [`TranscodeError::GateClosed`];
    /// encodes already running are left to complete.
    pub fn shutdown(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            info!("Pipeline shutting down");
            self.gate().close();
        }
    }
}

#[async_trait]
impl<F: Fetcher + 'static, E: Encoder + 'static> JobSubmitter for Pipeline<F, E> {
    async fn submit_job(
        &self,
        request: JobRequest,
        sink: Arc<dyn StatusSink>,
    ) -> Result<JobHandle, PipelineError> {
        self.submit(request, sink).await
    }
}

/// What a job's task needs from the pipeline.
struct JobContext<F: Fetcher, E: Encoder> {
    fetcher: Arc<F>,
    stage: Arc<TranscodeStage<E>>,
    board: Board,
    max_retries: u32,
}

impl<F: Fetcher, E: Encoder> JobContext<F, E> {
    async fn run(
        self,
        mut job: Job,
        reporter: ProgressReporter,
        phase: watch::Sender<JobPhase>,
    ) -> JobReport {
        let result = AssertUnwindSafe(self.execute(&mut job, &reporter, &phase))
            .catch_unwind()
            .await;

        let outcome = result.unwrap_or_else(|panic| {
            let reason = panic_message(panic.as_ref());
            error!(job_id = %job.id, reason = %reason, "Job panicked");
            reporter.report("Failed!");
            JobOutcome::Crashed(reason)
        });

        self.board.write().await.remove(&job.id);
        metrics::JOBS_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        info!(job_id = %job.id, outcome = outcome.label(), "Job finished");

        let log = reporter.finish().await;
        JobReport { job, outcome, log }
    }

    async fn execute(
        &self,
        job: &mut Job,
        progress: &ProgressReporter,
        phase: &watch::Sender<JobPhase>,
    ) -> JobOutcome {
        let fetched = match self
            .fetcher
            .fetch(&job.identifier, self.max_retries, progress)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Fetch failed");
                progress.report(format!("Download failed: {e}"));
                return JobOutcome::FetchFailed(e);
            }
        };

        let Some(path) = fetched.path else {
            progress.report("Filename not provided, skipping recode.");
            return JobOutcome::Skipped;
        };
        progress.report("Download completed.");

        job.resolved_path = Some(path.clone());
        if let Some(entry) = self.board.write().await.get_mut(&job.id) {
            entry.job.resolved_path = Some(path.clone());
        }

        match self.stage.run(&path, job.strategy, progress, phase).await {
            Ok(transcoded) => {
                progress.report("Done!");
                JobOutcome::Transcoded(transcoded)
            }
            Err(e) => {
                let line = match &e {
                    TranscodeError::FileNotFound { .. } => "Output file not found.".to_string(),
                    other => format!("Failed! {other}"),
                };
                progress.report(line);
                JobOutcome::TranscodeFailed(e)
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
