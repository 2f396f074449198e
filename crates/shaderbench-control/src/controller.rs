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

//! The top-level run driver.

use crate::cancel::CancelToken;
use crate::phase::SchedulerState;
use crate::scheduler::PhaseScheduler;
use crate::status::{RunStatus, StatusHandle};
use chrono::Local;
use shaderbench_core::{
    stats, BenchmarkCase, ConfigError, RenderHost, ResultRow, RowMeta, RunConfig,
};
use shaderbench_io::pending::PENDING_FILE_NAME;
use shaderbench_io::{PendingQueue, ResultLog, Sink, UploadOutcome, Uploader};
use std::path::PathBuf;

const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every case and repetition was measured.
    Completed,
    /// The run stopped on a cancellation request.
    Cancelled,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Label the rows were recorded under.
    pub run_label: String,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Rows recorded by this run, in recording order.
    pub rows: Vec<ResultRow>,
    /// CSV log, if it could be created.
    pub log_path: Option<PathBuf>,
    /// Rows still waiting for the sink.
    pub pending_rows: usize,
    /// Whether the sink acknowledged the close-out request.
    pub finalized: bool,
}

/// The pending queue together with the uploader that drains it.
struct UploadLane {
    uploader: Uploader,
    queue: PendingQueue,
}

impl UploadLane {
    async fn flush(&mut self, status: &StatusHandle) -> UploadOutcome {
        let outcome = self.uploader.flush(&mut self.queue).await;
        self.publish(status);
        outcome
    }

    fn publish(&self, status: &StatusHandle) {
        let pending = self.queue.len();
        let last = self.uploader.last_status().map(str::to_string);
        status.update(|s| {
            s.pending_uploads = pending;
            if last.is_some() {
                s.last_upload_status = last;
            }
        });
    }
}

/// Runs every configured case against a render host, records one row per
/// repetition and delivers the rows to the sink.
///
/// Construction validates the configuration and touches nothing on disk. All
/// files are created by [`RunController::run`].
pub struct RunController<H: RenderHost> {
    config: RunConfig,
    cases: Vec<BenchmarkCase>,
    host: H,
    uploader: Option<Uploader>,
    run_label: String,
    started_at: String,
    cancel: CancelToken,
    status: StatusHandle,
}

impl<H: RenderHost> RunController<H> {
    /// Validates `config` against `cases` and prepares a run.
    pub fn new(
        config: RunConfig,
        cases: Vec<BenchmarkCase>,
        host: H,
    ) -> Result<Self, ConfigError> {
        config.validate(&cases)?;

        let started_at = Local::now().format(FILE_TIMESTAMP_FORMAT).to_string();
        let run_label = config.label.resolve(&started_at);
        let status = StatusHandle::new();
        status.update(|s| {
            s.run_label = run_label.clone();
            s.total_cases = cases.len();
            s.repetitions = config.repetitions;
        });

        Ok(Self {
            config,
            cases,
            host,
            uploader: None,
            run_label,
            started_at,
            cancel: CancelToken::new(),
            status,
        })
    }

    /// Attaches the sink rows are uploaded to. Ignored when uploads are disabled.
    pub fn with_sink(mut self, sink: Box<dyn Sink>) -> Self {
        let upload = &self.config.upload;
        self.uploader = Some(Uploader::new(sink, upload.token.clone(), upload.batch_size));
        self
    }

    /// Uses `cancel` instead of the controller's own token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels the run at its next suspension point.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Handle for observers that want live progress.
    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    /// The current progress.
    pub fn current_status(&self) -> RunStatus {
        self.status.snapshot()
    }

    /// The label every row of this run carries.
    pub fn run_label(&self) -> &str {
        &self.run_label
    }

    /// Executes the run, consuming the controller.
    ///
    /// A controller runs once: its label and log name are fixed at
    /// construction, so a second run would reuse both. Sink and disk failures
    /// degrade the run but never stop it. Cancellation ends it early: rows
    /// recorded so far and the pending queue are kept, no flush or close-out
    /// is attempted. Observers keep their [`StatusHandle`] after the run.
    pub async fn run(mut self) -> RunReport {
        let target_fps = self.config.target_fps;
        let repetitions = self.config.repetitions;
        self.status.update(|s| {
            *s = RunStatus {
                is_running: true,
                run_label: self.run_label.clone(),
                total_cases: self.cases.len(),
                repetitions,
                ..Default::default()
            };
        });
        log::info!(
            "[Run] Starting '{}': {} case(s) x {} repetition(s), target {} FPS",
            self.run_label,
            self.cases.len(),
            repetitions,
            target_fps
        );

        let mut lane = self.open_upload_lane().await;
        let mut result_log = self.open_result_log();
        let log_path = result_log.as_ref().map(|csv| csv.path().to_path_buf());

        let scheduler = PhaseScheduler::new(
            self.config.warmup(),
            self.config.measurement(),
            self.cancel.clone(),
            self.status.clone(),
        );
        let environment = self.host.environment_info();
        let flush_threshold = self.config.flush_threshold();
        let mut rows = Vec::new();
        let mut outcome = RunOutcome::Completed;

        'cases: for (index, case) in self.cases.iter().enumerate() {
            let case_name = case.display_name(index);
            for repetition in 1..=repetitions {
                if self.cancel.is_cancelled() {
                    scheduler.mark_cancelled();
                    outcome = RunOutcome::Cancelled;
                    break 'cases;
                }
                self.status.update(|s| {
                    s.case_name = case_name.clone();
                    s.case_index = index + 1;
                    s.repetition = repetition;
                });
                log::debug!("[Run] {case_name} repetition {repetition}/{repetitions}");

                let samples = match scheduler.run_repetition(&mut self.host, case).await {
                    Ok(samples) => samples,
                    Err(_) => {
                        outcome = RunOutcome::Cancelled;
                        break 'cases;
                    }
                };

                let stats = samples.reduce();
                let classification = stats::classify(&stats, target_fps);
                let row = ResultRow::build(
                    RowMeta {
                        run_label: self.run_label.clone(),
                        timestamp: Local::now().format(ROW_TIMESTAMP_FORMAT).to_string(),
                        case_name: case_name.clone(),
                        repetition,
                        environment: environment.clone(),
                    },
                    case,
                    &stats,
                    classification,
                );
                log::info!(
                    "[Run] {} #{}: CPU p95 {:.2}ms, GPU p95 {:.2}ms, {:.1} FPS avg ({} / {})",
                    row.case_name,
                    repetition,
                    row.cpu_ms_p95,
                    row.gpu_ms_p95,
                    row.fps_avg,
                    row.bottleneck,
                    row.rating
                );

                if let Some(csv) = result_log.as_mut() {
                    if let Err(e) = csv.append(&row) {
                        log::error!("[Run] {e}. Continuing without the local log.");
                        result_log = None;
                    }
                }

                if let Some(lane) = lane.as_mut() {
                    if let Err(e) = lane.queue.enqueue(row.clone()) {
                        log::warn!("[Run] Row queued in memory only: {e}");
                    }
                    lane.publish(&self.status);
                    if lane.queue.len() >= flush_threshold {
                        lane.flush(&self.status).await;
                    }
                }

                rows.push(row);
                self.status.update(|s| s.rows_recorded += 1);
            }
        }

        let finalized = match (outcome, lane.as_mut()) {
            (RunOutcome::Completed, Some(lane)) => {
                lane.flush(&self.status).await;
                let finalized = lane
                    .uploader
                    .finalize_run(&self.run_label, target_fps)
                    .await
                    .is_ok();
                lane.publish(&self.status);
                finalized
            }
            (RunOutcome::Cancelled, _) => {
                log::warn!(
                    "[Run] '{}' cancelled after {} row(s)",
                    self.run_label,
                    rows.len()
                );
                false
            }
            (RunOutcome::Completed, None) => false,
        };

        let pending_rows = lane.as_ref().map_or(0, |lane| lane.queue.len());

        self.status.update(|s| {
            s.is_running = false;
            s.has_finished = true;
            s.log_path = log_path.clone();
            s.pending_uploads = pending_rows;
            if outcome == RunOutcome::Cancelled {
                s.phase = SchedulerState::Cancelled;
            }
        });
        if outcome == RunOutcome::Completed {
            log::info!(
                "[Run] '{}' completed: {} row(s), {} pending upload(s)",
                self.run_label,
                rows.len(),
                pending_rows
            );
        }

        RunReport {
            run_label: self.run_label,
            outcome,
            rows,
            log_path,
            pending_rows,
            finalized,
        }
    }

    /// Loads the pending snapshot and pushes whatever a previous run left behind.
    async fn open_upload_lane(&mut self) -> Option<UploadLane> {
        if !self.config.upload.enabled {
            return None;
        }
        let Some(uploader) = self.uploader.take() else {
            log::warn!("[Run] Uploads are enabled but no sink is attached; rows stay local");
            return None;
        };

        let mut queue = PendingQueue::new(
            self.config.output_dir.join(PENDING_FILE_NAME),
            self.config.upload.token.clone(),
            self.run_label.clone(),
        );
        match queue.load_from_durable() {
            Ok(0) => {}
            Ok(recovered) => {
                log::info!("[Run] Recovered {recovered} pending row(s) from a previous run");
            }
            Err(e) => log::warn!("[Run] Starting with an empty upload queue: {e}"),
        }

        let mut lane = UploadLane { uploader, queue };
        if !lane.queue.is_empty() {
            lane.flush(&self.status).await;
        }
        lane.publish(&self.status);
        Some(lane)
    }

    fn open_result_log(&self) -> Option<ResultLog> {
        match ResultLog::create_in(&self.config.output_dir, &self.started_at) {
            Ok(csv) => Some(csv),
            Err(e) => {
                log::error!("[Run] {e}. Results will not be logged locally.");
                None
            }
        }
    }
}
