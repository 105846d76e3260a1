//! Pipeline lifecycle integration tests.
//!
//! These tests verify the orchestrator with mock fetcher and encoder:
//! - Terminal outcomes for skip, fetch failure, encode failure and crashes
//! - Mutual exclusion under an encoder gate of one
//! - Encoder slots released on every path
//! - Per-job progress ordering and the status board

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use tuberecode_core::{
    pipeline::STATUS_HEADER,
    testing::{fixtures, EncodeEvent, MockEncoder, MockFetcher, RecordingSink},
    EncodePass, EncodeStrategy, FetchError, JobOutcome, JobPhase, JobReport, JobRequest, Pipeline,
    PipelineConfig, PipelineError, TranscodeError,
};

/// Test helper to create a pipeline with mocks.
struct TestHarness {
    pipeline: Pipeline<MockFetcher, MockEncoder>,
    fetcher: MockFetcher,
    encoder: MockEncoder,
    source: PathBuf,
    _dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_encoders(1)
    }

    fn with_encoders(n: usize) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let source = dir.path().join("clip.mkv");
        fixtures::touch(&source).expect("Failed to create source file");

        let fetcher = MockFetcher::returning(&source);
        let encoder = MockEncoder::new();
        let pipeline = Pipeline::new(
            PipelineConfig::default().with_parallel_encoders(n),
            fetcher.clone(),
            encoder.clone(),
        );

        Self {
            pipeline,
            fetcher,
            encoder,
            source,
            _dir: dir,
        }
    }

    async fn run(&self, id: &str, strategy: EncodeStrategy) -> JobReport {
        let request = JobRequest::new(id, strategy);
        tokio::time::timeout(
            Duration::from_secs(10),
            self.pipeline.run(request, Arc::new(RecordingSink::new())),
        )
        .await
        .expect("job did not finish")
        .expect("job task failed")
    }
}

fn messages(report: &JobReport) -> Vec<&str> {
    report
        .log
        .entries()
        .iter()
        .map(|e| e.message.as_str())
        .collect()
}

#[tokio::test]
async fn test_successful_two_pass_job() {
    let h = TestHarness::new();
    let sink = RecordingSink::new();

    let report = h
        .pipeline
        .run(
            JobRequest::new("abc123", EncodeStrategy::CpuTwoPass),
            Arc::new(sink.clone()),
        )
        .await
        .unwrap();

    match &report.outcome {
        JobOutcome::Transcoded(t) => {
            assert_eq!(t.input, h.source);
            assert_eq!(t.strategy, EncodeStrategy::CpuTwoPass);
        }
        other => panic!("expected transcode, got {other:?}"),
    }
    assert_eq!(report.job.resolved_path.as_ref(), Some(&h.source));
    assert_eq!(
        messages(&report),
        vec![
            "Downloading video...",
            "Download completed.",
            "Recoding, first pass...",
            "Recoding, second pass...",
            "Done!",
        ]
    );

    let elapsed: Vec<_> = report.log.entries().iter().map(|e| e.elapsed).collect();
    assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));

    let last = sink.last_update().await.unwrap();
    assert_eq!(last, report.log.render());
    assert!(last.starts_with(STATUS_HEADER));
    assert_eq!(h.pipeline.gate().in_use(), 0);
}

#[tokio::test]
async fn test_missing_filename_skips_without_touching_gate() {
    let h = TestHarness::new();
    h.fetcher.set_filename(None).await;
    // With the only slot taken, an acquire would block until the timeout.
    let _held = h.pipeline.gate().try_acquire().unwrap();

    let report = h.run("abc", EncodeStrategy::CpuTwoPass).await;

    assert!(matches!(report.outcome, JobOutcome::Skipped));
    assert!(report.outcome.is_success());
    assert_eq!(
        messages(&report).last().copied(),
        Some("Filename not provided, skipping recode.")
    );
    assert!(h.encoder.recorded_events().await.is_empty());
    assert_eq!(h.pipeline.gate().queued(), 0);
}

#[tokio::test]
async fn test_fetch_failure_never_encodes() {
    let h = TestHarness::new();
    h.fetcher.set_next_error(FetchError::Timeout { attempts: 6 }).await;

    let report = h.run("abc", EncodeStrategy::GpuSinglePass).await;

    assert!(matches!(
        report.outcome,
        JobOutcome::FetchFailed(FetchError::Timeout { attempts: 6 })
    ));
    assert_eq!(
        messages(&report),
        vec!["Download failed: Download stalled after 6 attempt(s)"]
    );
    assert!(h.encoder.recorded_events().await.is_empty());
}

#[tokio::test]
async fn test_invalid_identifier_is_rejected() {
    let h = TestHarness::new();

    let report = h.run("abc&def", EncodeStrategy::GpuSinglePass).await;

    assert!(matches!(
        report.outcome,
        JobOutcome::FetchFailed(FetchError::InvalidIdentifier { .. })
    ));
    assert!(h.fetcher.recorded_fetches().await.is_empty());
}

#[tokio::test]
async fn test_missing_download_reports_not_found() {
    let h = TestHarness::new();
    h.fetcher
        .set_filename(Some(h.source.with_file_name("elsewhere.webm")))
        .await;

    let report = h.run("abc", EncodeStrategy::CpuTwoPass).await;

    assert!(matches!(
        report.outcome,
        JobOutcome::TranscodeFailed(TranscodeError::FileNotFound { .. })
    ));
    assert_eq!(messages(&report).last().copied(), Some("Output file not found."));
    assert_eq!(h.pipeline.gate().in_use(), 0);
}

#[tokio::test]
async fn test_encode_failure_releases_slot() {
    let h = TestHarness::new();
    h.encoder.set_fail_on(Some(EncodePass::First)).await;

    let report = h.run("abc", EncodeStrategy::CpuTwoPass).await;

    assert!(matches!(
        report.outcome,
        JobOutcome::TranscodeFailed(TranscodeError::EncodeFailed {
            pass: EncodePass::First,
            ..
        })
    ));
    assert_eq!(
        messages(&report).last().copied(),
        Some("Failed! Encoding failed in first pass")
    );
    assert_eq!(h.encoder.recorded_requests().await.len(), 1);
    assert_eq!(h.pipeline.gate().in_use(), 0);

    // The slot is usable again.
    h.encoder.set_fail_on(None).await;
    let report = h.run("def", EncodeStrategy::CpuTwoPass).await;
    assert!(matches!(report.outcome, JobOutcome::Transcoded(_)));
}

#[tokio::test]
async fn test_crash_mid_encode_releases_slot() {
    let h = TestHarness::new();
    h.encoder.set_panic_on(Some(EncodePass::Second)).await;

    let report = h.run("abc", EncodeStrategy::CpuTwoPass).await;

    assert!(matches!(report.outcome, JobOutcome::Crashed(_)));
    assert_eq!(messages(&report).last().copied(), Some("Failed!"));
    assert_eq!(h.pipeline.gate().in_use(), 0);
    assert_eq!(h.encoder.running(), 0);
    assert_eq!(h.pipeline.active_jobs().await, 0);

    h.encoder.set_panic_on(None).await;
    let report = h.run("def", EncodeStrategy::GpuSinglePass).await;
    assert!(matches!(report.outcome, JobOutcome::Transcoded(_)));
}

#[tokio::test]
async fn test_single_encoder_is_mutually_exclusive() {
    let h = TestHarness::new();
    h.encoder.set_delay(Duration::from_millis(100)).await;

    let first = h
        .pipeline
        .submit(
            JobRequest::new("first", EncodeStrategy::CpuTwoPass),
            Arc::new(RecordingSink::new()),
        )
        .await
        .unwrap();
    let second = h
        .pipeline
        .submit(
            JobRequest::new("second", EncodeStrategy::CpuTwoPass),
            Arc::new(RecordingSink::new()),
        )
        .await
        .unwrap();

    let (a, b) = tokio::join!(first.wait(), second.wait());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(matches!(a.outcome, JobOutcome::Transcoded(_)));
    assert!(matches!(b.outcome, JobOutcome::Transcoded(_)));

    assert_eq!(h.encoder.max_concurrency(), 1);

    // Both passes of one job finish before the other job starts.
    let events = h.encoder.recorded_events().await;
    assert_eq!(events.len(), 8);
    for pair in events.chunks(2) {
        match pair {
            [EncodeEvent::Started(s), EncodeEvent::Finished(f)] => assert_eq!(s, f),
            other => panic!("interleaved encodes: {other:?}"),
        }
    }

    let queued = [&a, &b]
        .iter()
        .filter(|r| r.log.contains("Encoders are busy. Queued..."))
        .count();
    assert_eq!(queued, 1);
}

#[tokio::test]
async fn test_concurrent_jobs_keep_separate_progress() {
    let h = TestHarness::new();
    h.encoder.set_delay(Duration::from_millis(50)).await;

    let ids = ["first", "second", "bad id!"];
    let sinks: Vec<RecordingSink> = ids.iter().map(|_| RecordingSink::new()).collect();
    let mut handles = Vec::new();
    for (id, sink) in ids.iter().zip(&sinks) {
        handles.push(
            h.pipeline
                .submit(
                    JobRequest::new(*id, EncodeStrategy::CpuTwoPass),
                    Arc::new(sink.clone()),
                )
                .await
                .unwrap(),
        );
    }

    let mut reports = Vec::new();
    for handle in handles {
        reports.push(handle.wait().await.unwrap());
    }

    let transcoded = [
        "Downloading video...",
        "Download completed.",
        "Recoding, first pass...",
        "Recoding, second pass...",
        "Done!",
    ];
    let mut queued = 0;
    for report in &reports[..2] {
        assert!(matches!(report.outcome, JobOutcome::Transcoded(_)));
        let mut lines = messages(report);
        if let Some(pos) = lines.iter().position(|m| *m == "Encoders are busy. Queued...") {
            assert_eq!(pos, 2, "queued line out of place: {lines:?}");
            lines.remove(pos);
            queued += 1;
        }
        assert_eq!(lines, transcoded);
    }
    assert_eq!(queued, 1);

    let failed = &reports[2];
    assert!(matches!(failed.outcome, JobOutcome::FetchFailed(_)));
    let lines = messages(failed);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Download failed:"));

    for (report, sink) in reports.iter().zip(&sinks) {
        let elapsed: Vec<_> = report.log.entries().iter().map(|e| e.elapsed).collect();
        assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));

        // Every rendering the sink saw is a prefix of this job's final log.
        let rendered = report.log.render();
        let updates = sink.updates().await;
        assert!(!updates.is_empty());
        for update in &updates {
            assert!(update.starts_with(STATUS_HEADER));
            assert!(rendered.starts_with(update.as_str()), "foreign update: {update:?}");
        }
        assert_eq!(sink.last_update().await, Some(rendered));
    }
}

#[tokio::test]
async fn test_parallel_encoders_run_concurrently() {
    let h = TestHarness::with_encoders(2);
    h.encoder.set_delay(Duration::from_millis(200)).await;

    let mut handles = Vec::new();
    for id in ["one", "two"] {
        handles.push(
            h.pipeline
                .submit(
                    JobRequest::new(id, EncodeStrategy::GpuSinglePass),
                    Arc::new(RecordingSink::new()),
                )
                .await
                .unwrap(),
        );
    }
    for handle in handles {
        let report = handle.wait().await.unwrap();
        assert!(!report.log.contains("Encoders are busy. Queued..."));
    }

    assert_eq!(h.encoder.max_concurrency(), 2);
}

#[tokio::test]
async fn test_status_board_tracks_live_jobs() {
    let h = TestHarness::new();
    h.encoder.set_delay(Duration::from_millis(300)).await;

    let handle = h
        .pipeline
        .submit(
            JobRequest::new("abc", EncodeStrategy::GpuSinglePass),
            Arc::new(RecordingSink::new()),
        )
        .await
        .unwrap();

    let mut encoding = None;
    for _ in 0..100 {
        let status = h.pipeline.status().await;
        if let Some(job) = status.jobs.first() {
            if job.phase == (JobPhase::Encoding { pass: EncodePass::Single }) {
                encoding = Some(job.clone());
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let snapshot = encoding.expect("job never reached encoding");
    assert_eq!(snapshot.job.id, handle.id());
    assert_eq!(snapshot.job.identifier, "abc");
    assert_eq!(snapshot.job.resolved_path.as_ref(), Some(&h.source));
    assert_eq!(h.pipeline.status().await.encoders.in_use, 1);

    handle.wait().await.unwrap();
    let status = h.pipeline.status().await;
    assert!(status.jobs.is_empty());
    assert_eq!(status.encoders.in_use, 0);
}

#[tokio::test]
async fn test_shutdown_fails_queued_jobs_and_rejects_new_ones() {
    let h = TestHarness::new();
    let held = h.pipeline.gate().try_acquire().unwrap();

    let handle = h
        .pipeline
        .submit(
            JobRequest::new("abc", EncodeStrategy::CpuTwoPass),
            Arc::new(RecordingSink::new()),
        )
        .await
        .unwrap();

    for _ in 0..100 {
        if h.pipeline.gate().queued() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.pipeline.gate().queued(), 1);

    h.pipeline.shutdown();
    let report = handle.wait().await.unwrap();
    assert!(matches!(
        report.outcome,
        JobOutcome::TranscodeFailed(TranscodeError::GateClosed)
    ));
    assert!(h.encoder.recorded_events().await.is_empty());

    let err = h
        .pipeline
        .submit(
            JobRequest::new("late", EncodeStrategy::CpuTwoPass),
            Arc::new(RecordingSink::new()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ShuttingDown));
    assert!(!h.pipeline.status().await.accepting);
    drop(held);
}
