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

//! The append-only local CSV log.
//!
//! One line per finalized row, written as soon as the row exists. The log is
//! best-effort: the controller keeps running if it cannot be created or written.

use crate::error::LogError;
use shaderbench_core::ResultRow;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Column header, in write order.
pub const CSV_HEADER: [&str; 31] = [
    "Timestamp",
    "CaseName",
    "Repetition",
    "GridX",
    "GridY",
    "Count",
    "Spacing",
    "GPUInstancing",
    "Shadows",
    "ReceiveShadows",
    "EnabledKW",
    "DisabledKW",
    "CPU_ms_avg",
    "CPU_ms_p95",
    "CPU_ms_min",
    "CPU_ms_max",
    "GPU_ms_avg",
    "GPU_ms_p95",
    "GPU_ms_min",
    "GPU_ms_max",
    "FPS_avg",
    "FPS_p95",
    "FPS_min",
    "FPS_max",
    "Platform",
    "GraphicsAPI",
    "DeviceModel",
    "OS",
    "Bottleneck",
    "Rating",
    "Summary",
];

/// Builds the conventional log file name for a run started at `timestamp` (`yyyyMMdd_HHmmss`).
pub fn log_file_name(timestamp: &str) -> String {
    format!("ShaderBench_{timestamp}.csv")
}

/// Upper bound on `_<n>` suffixes tried when runs share a start second.
const MAX_NAME_SUFFIX: u32 = 100;

/// An open CSV result log.
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
    file: File,
}

impl ResultLog {
    /// Creates the log at `path` and writes the header line.
    ///
    /// An existing file is never truncated: the call fails with
    /// [`ErrorKind::AlreadyExists`] instead.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let io_err = |source| LogError {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(io_err)?;
        writeln!(file, "{}", CSV_HEADER.join(",")).map_err(io_err)?;

        log::info!("[ResultLog] Writing results to '{}'", path.display());
        Ok(Self { path, file })
    }

    /// Creates a fresh log in `dir` for a run started at `timestamp`.
    ///
    /// Uses [`log_file_name`], or `ShaderBench_<timestamp>_<n>.csv` when an
    /// earlier run already claimed that name.
    pub fn create_in(dir: &Path, timestamp: &str) -> Result<Self, LogError> {
        let mut suffix = 1;
        loop {
            let name = if suffix == 1 {
                log_file_name(timestamp)
            } else {
                format!("ShaderBench_{timestamp}_{suffix}.csv")
            };
            match Self::create(dir.join(name)) {
                Err(e)
                    if e.source.kind() == ErrorKind::AlreadyExists
                        && suffix < MAX_NAME_SUFFIX =>
                {
                    suffix += 1;
                }
                result => return result,
            }
        }
    }

    /// Appends one row and flushes it to the OS.
    pub fn append(&mut self, row: &ResultRow) -> Result<(), LogError> {
        let line = format_row(row);
        writeln!(self.file, "{line}")
            .and_then(|_| self.file.flush())
            .map_err(|source| LogError {
                path: self.path.clone(),
                source,
            })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Renders a row as one CSV line (without the trailing newline).
pub fn format_row(row: &ResultRow) -> String {
    let env = &row.environment;
    let cols: [String; 31] = [
        escape_field(&row.timestamp),
        escape_field(&row.case_name),
        row.repetition.to_string(),
        row.grid_x.to_string(),
        row.grid_y.to_string(),
        row.count.to_string(),
        row.spacing.to_string(),
        row.gpu_instancing.to_string(),
        row.shadows.to_string(),
        row.receive_shadows.to_string(),
        escape_field(&row.enabled_keywords),
        escape_field(&row.disabled_keywords),
        format!("{:.2}", row.cpu_ms_avg),
        format!("{:.2}", row.cpu_ms_p95),
        format!("{:.2}", row.cpu_ms_min),
        format!("{:.2}", row.cpu_ms_max),
        format!("{:.2}", row.gpu_ms_avg),
        format!("{:.2}", row.gpu_ms_p95),
        format!("{:.2}", row.gpu_ms_min),
        format!("{:.2}", row.gpu_ms_max),
        format!("{:.1}", row.fps_avg),
        format!("{:.1}", row.fps_p95),
        format!("{:.1}", row.fps_min),
        format!("{:.1}", row.fps_max),
        escape_field(&env.platform),
        escape_field(&env.gpu_api),
        escape_field(&env.device),
        escape_field(&env.os),
        escape_field(&row.bottleneck.to_string()),
        escape_field(&row.rating.to_string()),
        escape_field(&row.summary),
    ];
    cols.join(",")
}

/// Quotes a field that contains a comma, a quote or a line break, doubling inner quotes.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
