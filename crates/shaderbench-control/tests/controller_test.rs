// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use shaderbench_control::{CancelToken, RunController, RunOutcome, SchedulerState};
use shaderbench_core::{
    BenchmarkCase, ConfigError, EnvironmentInfo, HostFrame, RenderHost, RunConfig, UploadPolicy,
};
use shaderbench_io::pending::PENDING_FILE_NAME;
use shaderbench_io::{PendingQueue, Sink, SinkAction, SinkError, SinkRequest};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- TEST DOUBLES ---

/// What a [`ScriptedHost`] saw, readable after the controller consumed it.
#[derive(Debug, Default)]
struct HostLog {
    events: Vec<String>,
    frames: u32,
}

/// Renders one frame every 10ms with fixed timings and records its lifecycle.
#[derive(Default)]
struct ScriptedHost {
    log: Arc<Mutex<HostLog>>,
    cancel_at_frame: Option<(u32, CancelToken)>,
}

impl ScriptedHost {
    fn log(&self) -> Arc<Mutex<HostLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl RenderHost for ScriptedHost {
    async fn build_scene(&mut self, case: &BenchmarkCase) {
        self.log.lock().unwrap().events.push(format!("build {}", case.name));
    }

    async fn teardown_scene(&mut self) {
        self.log.lock().unwrap().events.push("teardown".to_string());
    }

    async fn sample_frame(&mut self) -> HostFrame {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let frames = {
            let mut log = self.log.lock().unwrap();
            log.frames += 1;
            log.frames
        };
        if let Some((frame, token)) = &self.cancel_at_frame {
            if frames == *frame {
                token.cancel();
            }
        }
        HostFrame::new(12.0, 6.0)
    }

    fn environment_info(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            platform: "Scripted".to_string(),
            gpu_api: "None".to_string(),
            device: "TestRig".to_string(),
            os: "TestOS".to_string(),
        }
    }
}

/// Records every request; when `down` is set, every request fails.
#[derive(Clone, Default)]
struct RecordingSink {
    requests: Arc<Mutex<Vec<SinkRequest>>>,
    down: bool,
}

impl RecordingSink {
    fn unreachable() -> Self {
        Self {
            down: true,
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<SinkRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn send(&self, request: &SinkRequest) -> Result<(), SinkError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.down {
            return Err(SinkError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }
}

fn config(output_dir: &Path, repetitions: u32) -> RunConfig {
    let mut config = RunConfig {
        warmup_seconds: 0.05,
        measure_seconds: 0.1,
        repetitions,
        target_fps: 60,
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };
    config.upload.enabled = true;
    config.upload.url = "http://sink.invalid/exec".to_string();
    config.upload.token = "secret".to_string();
    config.label.custom = Some("Test".to_string());
    config
}

fn lit_case() -> BenchmarkCase {
    BenchmarkCase {
        name: "Lit".to_string(),
        grid_x: 10,
        grid_y: 10,
        ..Default::default()
    }
}

/// (action, sheet name, row count) of every request.
fn request_shape(requests: &[SinkRequest]) -> Vec<(&'static str, String, usize)> {
    requests
        .iter()
        .map(|r| match &r.action {
            SinkAction::Append { rows } => ("append", r.sheet_name.clone(), rows.len()),
            SinkAction::Finalize { .. } => ("finalize", r.sheet_name.clone(), 0),
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_one_case_two_repetitions_end_to_end() {
    // --- 1. ARRANGE ---
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::default();
    let host = ScriptedHost::default();
    let host_log = host.log();
    let controller = RunController::new(config(dir.path(), 2), vec![lit_case()], host)
        .unwrap()
        .with_sink(Box::new(sink.clone()));
    assert_eq!(controller.run_label(), "Run_Test");
    let before = controller.current_status();
    assert!(!before.is_running && !before.has_finished);
    assert_eq!((before.total_cases, before.repetitions), (1, 2));
    let status = controller.status_handle();

    // --- 2. ACT ---
    let report = controller.run().await;

    // --- 3. ASSERT ---
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].repetition, 1);
    assert_eq!(report.rows[1].repetition, 2);
    assert!(report.rows[0].timestamp <= report.rows[1].timestamp);
    assert!(report.rows.iter().all(|r| r.run_label == "Run_Test"));
    assert_eq!(report.rows[0].cpu_ms_avg, 12.0);
    assert_eq!(report.rows[0].gpu_ms_avg, 6.0);
    assert_eq!(report.rows[0].environment.device, "TestRig");

    // Each row is flushed as it is recorded, then the run is closed out exactly once.
    let requests = sink.requests();
    assert_eq!(
        request_shape(&requests),
        vec![
            ("append", "Run_Test".to_string(), 1),
            ("append", "Run_Test".to_string(), 1),
            ("finalize", "Run_Test".to_string(), 0),
        ]
    );
    assert_eq!(
        requests.last().unwrap().action,
        SinkAction::Finalize { target_fps: 60 }
    );
    assert!(report.finalized);
    assert_eq!(report.pending_rows, 0);

    assert_eq!(
        host_log.lock().unwrap().events,
        ["build Lit", "teardown", "build Lit", "teardown"]
    );

    let log_path = report.log_path.expect("the CSV log is created");
    let csv = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(csv.lines().count(), 3, "header plus one line per row");

    let status = status.snapshot();
    assert!(status.has_finished && !status.is_running);
    assert_eq!(status.rows_recorded, 2);
    assert_eq!(status.phase, SchedulerState::Done);
    assert_eq!(status.last_upload_status.as_deref(), Some("Finalized 'Run_Test'"));
}

#[tokio::test(start_paused = true)]
async fn test_batched_policy_flushes_full_batches_then_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), 3);
    config.upload.policy = UploadPolicy::Batched;
    config.upload.batch_size = 2;
    let sink = RecordingSink::default();

    let controller = RunController::new(config, vec![lit_case()], ScriptedHost::default())
        .unwrap()
        .with_sink(Box::new(sink.clone()));
    let report = controller.run().await;

    assert_eq!(report.rows.len(), 3);
    assert_eq!(
        request_shape(&sink.requests()),
        vec![
            ("append", "Run_Test".to_string(), 2),
            ("append", "Run_Test".to_string(), 1),
            ("finalize", "Run_Test".to_string(), 0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_sink_never_stops_the_run() {
    // --- 1. ARRANGE ---
    let dir = tempfile::tempdir().unwrap();
    let down = RecordingSink::unreachable();
    let controller = RunController::new(
        config(dir.path(), 2),
        vec![lit_case()],
        ScriptedHost::default(),
    )
    .unwrap()
    .with_sink(Box::new(down.clone()));
    let status = controller.status_handle();

    // --- 2. ACT ---
    let report = controller.run().await;

    // --- 3. ASSERT ---
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.pending_rows, 2);
    assert!(!report.finalized);
    // One attempt per recorded row, one at the end of the run, then the close-out.
    assert_eq!(down.requests().len(), 4);

    let mut snapshot = PendingQueue::new(dir.path().join(PENDING_FILE_NAME), "", "");
    assert_eq!(snapshot.load_from_durable().unwrap(), 2);
    assert_eq!(snapshot.rows(), report.rows.as_slice());
    assert!(status
        .snapshot()
        .last_upload_status
        .unwrap()
        .starts_with("Finalize failed"));
}

#[tokio::test(start_paused = true)]
async fn test_next_run_recovers_rows_left_by_previous_run() {
    // --- 1. ARRANGE ---
    let dir = tempfile::tempdir().unwrap();
    let first = RunController::new(
        config(dir.path(), 1),
        vec![lit_case()],
        ScriptedHost::default(),
    )
    .unwrap()
    .with_sink(Box::new(RecordingSink::unreachable()));
    let first_report = first.run().await;
    assert_eq!(first_report.pending_rows, 1);

    let mut second_config = config(dir.path(), 1);
    second_config.label.custom = Some("Second".to_string());
    let sink = RecordingSink::default();
    let second = RunController::new(second_config, vec![lit_case()], ScriptedHost::default())
        .unwrap()
        .with_sink(Box::new(sink.clone()));

    // --- 2. ACT ---
    let report = second.run().await;

    // --- 3. ASSERT ---
    // The leftover row goes out first, under the label it was recorded with.
    assert_eq!(
        request_shape(&sink.requests()),
        vec![
            ("append", "Run_Test".to_string(), 1),
            ("append", "Run_Second".to_string(), 1),
            ("finalize", "Run_Second".to_string(), 0),
        ]
    );
    assert_eq!(report.pending_rows, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_mid_measurement_keeps_recorded_rows() {
    // --- 1. ARRANGE ---
    // 5 warmup + 10 measured frames per repetition: frame 23 falls in the
    // measuring phase of the second repetition.
    let dir = tempfile::tempdir().unwrap();
    let token = CancelToken::new();
    let host = ScriptedHost {
        cancel_at_frame: Some((23, token.clone())),
        ..Default::default()
    };
    let host_log = host.log();
    let sink = RecordingSink::unreachable();
    let controller = RunController::new(config(dir.path(), 3), vec![lit_case()], host)
        .unwrap()
        .with_sink(Box::new(sink.clone()))
        .with_cancel_token(token);
    let status = controller.status_handle();

    // --- 2. ACT ---
    let report = controller.run().await;

    // --- 3. ASSERT ---
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert_eq!(report.rows.len(), 1, "the interrupted repetition yields no row");
    assert_eq!(report.rows[0].repetition, 1);
    assert!(!report.finalized);

    // The recorded row is still queued, on disk as well.
    assert_eq!(report.pending_rows, 1);
    let mut snapshot = PendingQueue::new(dir.path().join(PENDING_FILE_NAME), "", "");
    assert_eq!(snapshot.load_from_durable().unwrap(), 1);
    assert_eq!(snapshot.rows(), report.rows.as_slice());

    // Only the per-row flush was attempted: no end-of-run flush, no close-out.
    let requests = sink.requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(requests[0].action, SinkAction::Append { .. }));

    let host = host_log.lock().unwrap();
    assert_eq!(host.frames, 23, "no frame is sampled after the cancellation");
    assert_eq!(
        host.events,
        ["build Lit", "teardown", "build Lit", "teardown"],
        "the interrupted scene is torn down"
    );

    let status = status.snapshot();
    assert_eq!(status.phase, SchedulerState::Cancelled);
    assert!(status.has_finished);
    assert_eq!(status.rows_recorded, 1);
}

#[test]
fn test_invalid_configuration_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("never-created");

    let no_cases = RunController::new(config(&output_dir, 1), Vec::new(), ScriptedHost::default());
    assert!(matches!(no_cases.err(), Some(ConfigError::NoCases)));

    let mut zero_measure = config(&output_dir, 1);
    zero_measure.measure_seconds = 0.0;
    let result = RunController::new(zero_measure, vec![lit_case()], ScriptedHost::default());
    assert!(matches!(
        result.err(),
        Some(ConfigError::InvalidDuration {
            field: "measure_seconds",
            ..
        })
    ));

    assert!(!output_dir.exists(), "no state is created for a rejected run");
}

#[tokio::test(start_paused = true)]
async fn test_disabled_uploads_only_log_locally() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), 1);
    config.upload.enabled = false;
    let sink = RecordingSink::default();

    let controller = RunController::new(config, vec![lit_case()], ScriptedHost::default())
        .unwrap()
        .with_sink(Box::new(sink.clone()));
    let report = controller.run().await;

    assert_eq!(report.rows.len(), 1);
    assert!(sink.requests().is_empty());
    assert!(!dir.path().join(PENDING_FILE_NAME).exists());
    assert!(report.log_path.unwrap().exists());
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_runs_keep_separate_logs() {
    // --- 1. ARRANGE ---
    // Both runs are labelled from the wall clock and very likely start within
    // the same second, so they compete for the same log name.
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), 2);
    config.upload.enabled = false;
    config.label.custom = None;

    // --- 2. ACT ---
    let first = RunController::new(config.clone(), vec![lit_case()], ScriptedHost::default())
        .unwrap()
        .run()
        .await;
    let second = RunController::new(config, vec![lit_case()], ScriptedHost::default())
        .unwrap()
        .run()
        .await;

    // --- 3. ASSERT ---
    let first_log = first.log_path.expect("first log is created");
    let second_log = second.log_path.expect("second log is created");
    assert_ne!(first_log, second_log);
    for log in [&first_log, &second_log] {
        let csv = std::fs::read_to_string(log).unwrap();
        assert_eq!(csv.lines().count(), 3, "header plus both rows in {log:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_output_dir_still_completes_and_uploads() {
    // --- 1. ARRANGE ---
    // The output directory sits below a regular file, so neither the CSV log
    // nor the pending snapshot can be written.
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();
    let sink = RecordingSink::default();
    let controller = RunController::new(
        config(&blocker.join("out"), 2),
        vec![lit_case()],
        ScriptedHost::default(),
    )
    .unwrap()
    .with_sink(Box::new(sink.clone()));
    let status = controller.status_handle();

    // --- 2. ACT ---
    let report = controller.run().await;

    // --- 3. ASSERT ---
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.log_path, None);
    assert_eq!(report.pending_rows, 0);
    assert!(report.finalized);
    assert_eq!(
        request_shape(&sink.requests()),
        vec![
            ("append", "Run_Test".to_string(), 1),
            ("append", "Run_Test".to_string(), 1),
            ("finalize", "Run_Test".to_string(), 0),
        ]
    );
    assert_eq!(status.snapshot().rows_recorded, 2);
}
