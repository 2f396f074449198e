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

//! The finalized outcome of one (case, repetition) pair.

use crate::case::BenchmarkCase;
use crate::host::EnvironmentInfo;
use crate::stats::{Bottleneck, Classification, Rating, Stats};
use serde::{Deserialize, Serialize};

/// Identity and context of a row, supplied by the run controller.
#[derive(Debug, Clone)]
pub struct RowMeta {
    /// Label of the run the row belongs to.
    pub run_label: String,
    /// Wall-clock time the row was finalized (`yyyy-MM-dd HH:mm:ss`).
    pub timestamp: String,
    /// Resolved case name.
    pub case_name: String,
    /// 1-based repetition index.
    pub repetition: u32,
    /// Device and graphics stack.
    pub environment: EnvironmentInfo,
}

/// One result row, the unit of persistence and upload.
///
/// Serialized field names are the column names expected by the sink and used
/// in the CSV header. Timing values are rounded to 2 decimals, FPS values to 1.
#[allow(missing_docs)] // Fields mirror the column names above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "RunLabel", default)]
    pub run_label: String,
    #[serde(rename = "CaseName")]
    pub case_name: String,
    #[serde(rename = "Repetition")]
    pub repetition: u32,
    #[serde(rename = "GridX")]
    pub grid_x: u32,
    #[serde(rename = "GridY")]
    pub grid_y: u32,
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Spacing")]
    pub spacing: f32,
    #[serde(rename = "GPUInstancing")]
    pub gpu_instancing: bool,
    #[serde(rename = "Shadows")]
    pub shadows: bool,
    #[serde(rename = "ReceiveShadows")]
    pub receive_shadows: bool,
    #[serde(rename = "EnabledKW")]
    pub enabled_keywords: String,
    #[serde(rename = "DisabledKW")]
    pub disabled_keywords: String,

    #[serde(rename = "CPU_ms_avg")]
    pub cpu_ms_avg: f64,
    #[serde(rename = "CPU_ms_p95")]
    pub cpu_ms_p95: f64,
    #[serde(rename = "CPU_ms_min")]
    pub cpu_ms_min: f64,
    #[serde(rename = "CPU_ms_max")]
    pub cpu_ms_max: f64,
    #[serde(rename = "GPU_ms_avg")]
    pub gpu_ms_avg: f64,
    #[serde(rename = "GPU_ms_p95")]
    pub gpu_ms_p95: f64,
    #[serde(rename = "GPU_ms_min")]
    pub gpu_ms_min: f64,
    #[serde(rename = "GPU_ms_max")]
    pub gpu_ms_max: f64,
    #[serde(rename = "FPS_avg")]
    pub fps_avg: f64,
    #[serde(rename = "FPS_p95")]
    pub fps_p95: f64,
    #[serde(rename = "FPS_min")]
    pub fps_min: f64,
    #[serde(rename = "FPS_max")]
    pub fps_max: f64,

    #[serde(flatten)]
    pub environment: EnvironmentInfo,

    #[serde(rename = "Bottleneck")]
    pub bottleneck: Bottleneck,
    #[serde(rename = "Rating")]
    pub rating: Rating,
    #[serde(rename = "Summary")]
    pub summary: String,
}

impl ResultRow {
    /// Assembles a row from its context, the case parameters and the reduced statistics.
    pub fn build(
        meta: RowMeta,
        case: &BenchmarkCase,
        stats: &Stats,
        classification: Classification,
    ) -> Self {
        Self {
            timestamp: meta.timestamp,
            run_label: meta.run_label,
            case_name: meta.case_name,
            repetition: meta.repetition,
            grid_x: case.grid_x,
            grid_y: case.grid_y,
            count: case.instance_count(),
            spacing: case.spacing,
            gpu_instancing: case.gpu_instancing,
            shadows: case.cast_shadows,
            receive_shadows: case.receive_shadows,
            enabled_keywords: case.enabled_keywords.clone(),
            disabled_keywords: case.disabled_keywords.clone(),
            cpu_ms_avg: round_to(stats.cpu.avg, 2),
            cpu_ms_p95: round_to(stats.cpu.p95, 2),
            cpu_ms_min: round_to(stats.cpu.min, 2),
            cpu_ms_max: round_to(stats.cpu.max, 2),
            gpu_ms_avg: round_to(stats.gpu.avg, 2),
            gpu_ms_p95: round_to(stats.gpu.p95, 2),
            gpu_ms_min: round_to(stats.gpu.min, 2),
            gpu_ms_max: round_to(stats.gpu.max, 2),
            fps_avg: round_to(stats.fps.avg, 1),
            fps_p95: round_to(stats.fps.p95, 1),
            fps_min: round_to(stats.fps.min, 1),
            fps_max: round_to(stats.fps.max, 1),
            environment: meta.environment,
            bottleneck: classification.bottleneck,
            rating: classification.rating,
            summary: classification.summary,
        }
    }

    /// Key under which the sink deduplicates rows: (run label, case name, repetition).
    pub fn dedup_key(&self) -> (&str, &str, u32) {
        (&self.run_label, &self.case_name, self.repetition)
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
