//! Progress reporting integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use meanframe::{OperationType, ProgressCallback, ProgressInfo, RunOptions, process_video};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

/// Records every progress update it receives.
#[derive(Default)]
struct RecordingProgress {
    updates: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.updates.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_is_reported_in_batches() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let recorder = Arc::new(RecordingProgress::default());
    let options = RunOptions::new()
        .with_output_dir(temporary_directory.path())
        .with_progress(recorder.clone())
        .with_batch_size(10);

    let report = process_video(Path::new(path), 4, &options).expect("Job should succeed");

    let updates = recorder.updates.lock().unwrap();
    let accumulation: Vec<_> = updates
        .iter()
        .filter(|info| info.operation == OperationType::FrameAccumulation)
        .collect();
    assert_eq!(accumulation.len() as u64, report.total_frames / 10);
    for window in accumulation.windows(2) {
        assert!(window[1].current > window[0].current);
        assert!(window[1].samples >= window[0].samples);
    }

    let last = updates.last().expect("Expected a final update");
    assert_eq!(last.operation, OperationType::ImageExport);
    assert_eq!(last.current, report.total_frames);
    assert_eq!(last.samples, report.sample_count);
    assert_eq!(last.stride, 4);
    assert_eq!(last.video, Path::new(path));
}

#[test]
fn percentage_never_exceeds_one_hundred() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let recorder = Arc::new(RecordingProgress::default());
    let options = RunOptions::new()
        .with_output_dir(temporary_directory.path())
        .with_progress(recorder.clone());

    process_video(Path::new(path), 0, &options).expect("Job should succeed");

    let updates = recorder.updates.lock().unwrap();
    assert!(!updates.is_empty());
    for info in updates.iter() {
        if let Some(percentage) = info.percentage {
            assert!((0.0..=100.0).contains(&percentage), "got {percentage}");
        }
    }
}

#[test]
fn failed_job_reports_nothing() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = temporary_directory.path().join("missing.mp4");
    let recorder = Arc::new(RecordingProgress::default());
    let options = RunOptions::new()
        .with_output_dir(temporary_directory.path().join("output"))
        .with_progress(recorder.clone());

    assert!(process_video(&missing, 0, &options).is_err());
    assert!(recorder.updates.lock().unwrap().is_empty());
}
