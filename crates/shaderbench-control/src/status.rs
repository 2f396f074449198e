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

//! Read-only progress of a run, for observers.

use crate::phase::SchedulerState;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// A snapshot of a run's progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatus {
    /// A run is in progress.
    pub is_running: bool,
    /// The run reached its end, normally or by cancellation.
    pub has_finished: bool,
    /// Label of the run.
    pub run_label: String,
    /// Name of the case being benchmarked.
    pub case_name: String,
    /// 1-based index of the current case.
    pub case_index: usize,
    /// Number of configured cases.
    pub total_cases: usize,
    /// 1-based repetition of the current case.
    pub repetition: u32,
    /// Configured repetitions per case.
    pub repetitions: u32,
    /// Scheduler state.
    pub phase: SchedulerState,
    /// Time spent in the current phase.
    pub phase_elapsed: Duration,
    /// Configured length of the current phase.
    pub phase_duration: Duration,
    /// CPU time of the last frame, in milliseconds.
    pub instant_cpu_ms: f64,
    /// GPU time of the last frame, in milliseconds.
    pub instant_gpu_ms: f64,
    /// Frame rate implied by the last frame.
    pub instant_fps: f64,
    /// Rows recorded so far in this run.
    pub rows_recorded: usize,
    /// Rows waiting in the upload queue.
    pub pending_uploads: usize,
    /// Outcome of the last request to the sink.
    pub last_upload_status: Option<String>,
    /// Location of the CSV log, once it exists.
    pub log_path: Option<PathBuf>,
}

impl RunStatus {
    /// Fraction of the current phase already elapsed, in `[0, 1]`.
    pub fn phase_progress(&self) -> f64 {
        if self.phase_duration.is_zero() {
            return if self.phase.is_active() { 1.0 } else { 0.0 };
        }
        (self.phase_elapsed.as_secs_f64() / self.phase_duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// A cloneable handle onto the live [`RunStatus`].
///
/// The controller and scheduler write through it; observers only get snapshots.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<RunStatus>>,
}

impl StatusHandle {
    /// Creates a handle onto a fresh, idle status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current status.
    pub fn snapshot(&self) -> RunStatus {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut RunStatus)) {
        let mut status = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut status);
    }
}
