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

//! Run configuration, immutable for the duration of a run.

use crate::case::BenchmarkCase;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Label used for every run when one sheet per run is disabled.
pub const SHARED_RUN_LABEL: &str = "Results";

/// When rows are pushed to the sink.
///
/// Both policies go through the same drain loop; they only differ in the queue
/// length that triggers a flush (see [`RunConfig::flush_threshold`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPolicy {
    /// Flush as soon as a single row is pending.
    #[default]
    EachRow,
    /// Flush once a full batch is pending; the remainder goes out at the end of the run.
    Batched,
}

/// Remote sink settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Master switch for queueing and uploading rows.
    pub enabled: bool,
    /// Endpoint receiving the JSON batches.
    pub url: String,
    /// Shared secret checked by the sink.
    pub token: String,
    /// Flush cadence.
    pub policy: UploadPolicy,
    /// Maximum number of rows per request.
    pub batch_size: usize,
    /// Request timeout, in seconds.
    pub timeout_seconds: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            token: String::new(),
            policy: UploadPolicy::EachRow,
            batch_size: 32,
            timeout_seconds: 30,
        }
    }
}

/// How the run label (the sink-side grouping key) is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLabelConfig {
    /// Give every run its own label. When `false`, all runs share [`SHARED_RUN_LABEL`].
    pub new_sheet_per_run: bool,
    /// Prefix prepended to the generated or custom label.
    pub prefix: String,
    /// User-supplied label. Replaces the timestamp when set and non-empty.
    pub custom: Option<String>,
}

impl Default for RunLabelConfig {
    fn default() -> Self {
        Self {
            new_sheet_per_run: true,
            prefix: "Run_".to_string(),
            custom: None,
        }
    }
}

impl RunLabelConfig {
    /// Resolves the label for a run started at `timestamp` (formatted `yyyyMMdd_HHmmss`).
    pub fn resolve(&self, timestamp: &str) -> String {
        if !self.new_sheet_per_run {
            return SHARED_RUN_LABEL.to_string();
        }
        match self.custom.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => format!("{}{}", self.prefix, custom),
            _ => format!("{}{}", self.prefix, timestamp),
        }
    }
}

/// Parameters of a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Length of the warmup phase preceding every measurement, in seconds. Zero skips it.
    pub warmup_seconds: f64,
    /// Length of the measuring phase, in seconds.
    pub measure_seconds: f64,
    /// Number of warmup + measure cycles per case.
    pub repetitions: u32,
    /// Frame rate the results are rated against.
    pub target_fps: u32,
    /// Seed handed to render hosts that simulate or randomize content.
    pub seed: u64,
    /// Directory receiving the CSV log and the pending-uploads snapshot.
    pub output_dir: PathBuf,
    /// Remote sink settings.
    pub upload: UploadConfig,
    /// Run label settings.
    pub label: RunLabelConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warmup_seconds: 3.0,
            measure_seconds: 10.0,
            repetitions: 2,
            target_fps: 72,
            seed: 1234,
            output_dir: PathBuf::from("ShaderBench"),
            upload: UploadConfig::default(),
            label: RunLabelConfig::default(),
        }
    }
}

impl RunConfig {
    /// The warmup duration. Invalid values collapse to zero; call [`RunConfig::validate`] first.
    pub fn warmup(&self) -> Duration {
        Duration::try_from_secs_f64(self.warmup_seconds).unwrap_or(Duration::ZERO)
    }

    /// The measurement duration. Invalid values collapse to zero; call [`RunConfig::validate`] first.
    pub fn measurement(&self) -> Duration {
        Duration::try_from_secs_f64(self.measure_seconds).unwrap_or(Duration::ZERO)
    }

    /// Frame budget in milliseconds derived from the target frame rate.
    pub fn frame_budget_ms(&self) -> f64 {
        crate::stats::frame_budget_ms(self.target_fps)
    }

    /// Number of pending rows that triggers a flush during the run.
    pub fn flush_threshold(&self) -> usize {
        match self.upload.policy {
            UploadPolicy::EachRow => 1,
            UploadPolicy::Batched => self.upload.batch_size.max(1),
        }
    }

    /// Checks the configuration against the case list.
    ///
    /// A run must refuse to start on any error returned here.
    pub fn validate(&self, cases: &[BenchmarkCase]) -> Result<(), ConfigError> {
        if cases.is_empty() {
            return Err(ConfigError::NoCases);
        }
        if !self.warmup_seconds.is_finite() || self.warmup_seconds < 0.0 {
            return Err(ConfigError::InvalidDuration {
                field: "warmup_seconds",
                value: self.warmup_seconds,
            });
        }
        if !self.measure_seconds.is_finite() || self.measure_seconds <= 0.0 {
            return Err(ConfigError::InvalidDuration {
                field: "measure_seconds",
                value: self.measure_seconds,
            });
        }
        if self.repetitions == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        if self.target_fps == 0 {
            return Err(ConfigError::ZeroTargetFps);
        }
        if self.upload.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.upload.enabled && self.upload.url.trim().is_empty() {
            return Err(ConfigError::MissingSinkUrl);
        }

        for (index, case) in cases.iter().enumerate() {
            if case.grid_x == 0 || case.grid_y == 0 {
                return Err(ConfigError::InvalidCase {
                    index,
                    reason: format!("grid {}x{} is empty", case.grid_x, case.grid_y),
                });
            }
            if !case.spacing.is_finite() || case.spacing <= 0.0 {
                return Err(ConfigError::InvalidCase {
                    index,
                    reason: format!("spacing {} must be positive", case.spacing),
                });
            }
        }

        log::debug!(
            "Run configuration valid: {} cases, {} repetitions, {:.2}s warmup, {:.2}s measure",
            cases.len(),
            self.repetitions,
            self.warmup_seconds,
            self.measure_seconds
        );
        Ok(())
    }
}
