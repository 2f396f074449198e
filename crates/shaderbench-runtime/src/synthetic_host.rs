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

//! A render host that simulates frame costs instead of rendering.
//!
//! Frame cost is derived from the case parameters with a simple model (more
//! instances cost more, instancing saves CPU, shadows cost a second pass) and
//! perturbed with seeded noise, so two runs with the same seed produce the
//! same samples.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shaderbench_core::{BenchmarkCase, EnvironmentInfo, HostFrame, RenderHost};
use std::time::Duration;
use sysinfo::System;

const BASE_CPU_MS: f64 = 1.2;
const BASE_GPU_MS: f64 = 0.8;
const CPU_MS_PER_DRAW: f64 = 0.0035;
const CPU_MS_PER_INSTANCED_OBJECT: f64 = 0.0004;
const GPU_MS_PER_OBJECT: f64 = 0.0022;
const SHADOW_PASS_FACTOR: f64 = 0.6;
const RECEIVE_SHADOWS_FACTOR: f64 = 0.15;
const KEYWORD_FACTOR: f64 = 0.04;

/// Probability that a frame reports no GPU timing.
const GPU_DROPOUT: f64 = 0.02;

/// Steady-state cost of one frame of a scene, before noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCost {
    /// CPU milliseconds per frame.
    pub cpu_ms: f64,
    /// GPU milliseconds per frame.
    pub gpu_ms: f64,
}

impl SceneCost {
    /// Nothing on screen.
    pub const EMPTY: SceneCost = SceneCost {
        cpu_ms: BASE_CPU_MS,
        gpu_ms: BASE_GPU_MS,
    };

    /// Estimates the cost of rendering `case`.
    pub fn for_case(case: &BenchmarkCase) -> Self {
        let objects = case.instance_count() as f64;

        let per_object_cpu = if case.gpu_instancing {
            CPU_MS_PER_INSTANCED_OBJECT
        } else {
            CPU_MS_PER_DRAW
        };
        let mut cpu_ms = BASE_CPU_MS + objects * per_object_cpu;
        let mut gpu_ms = BASE_GPU_MS + objects * GPU_MS_PER_OBJECT;

        if case.cast_shadows {
            cpu_ms += objects * per_object_cpu * SHADOW_PASS_FACTOR;
            gpu_ms += objects * GPU_MS_PER_OBJECT * SHADOW_PASS_FACTOR;
        }
        if case.receive_shadows {
            gpu_ms *= 1.0 + RECEIVE_SHADOWS_FACTOR;
        }
        gpu_ms *= 1.0 + KEYWORD_FACTOR * case.enabled_keyword_list().len() as f64;

        Self { cpu_ms, gpu_ms }
    }
}

/// A deterministic stand-in for a real render engine.
pub struct SyntheticHost {
    rng: ChaCha8Rng,
    frame_budget: Duration,
    scene: Option<SceneCost>,
    environment: EnvironmentInfo,
}

impl SyntheticHost {
    /// Creates a host whose noise is seeded with `seed` and whose frames take
    /// at least `frame_budget_ms`.
    pub fn new(seed: u64, frame_budget_ms: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            frame_budget: Duration::try_from_secs_f64(frame_budget_ms / 1000.0)
                .unwrap_or(Duration::ZERO),
            scene: None,
            environment: detect_environment(),
        }
    }

    /// Cost model of the current scene, if one is built.
    pub fn scene(&self) -> Option<SceneCost> {
        self.scene
    }
}

#[async_trait]
impl RenderHost for SyntheticHost {
    async fn build_scene(&mut self, case: &BenchmarkCase) {
        let cost = SceneCost::for_case(case);
        log::debug!(
            "[SyntheticHost] Built {} objects (~{:.2}ms CPU, ~{:.2}ms GPU)",
            case.instance_count(),
            cost.cpu_ms,
            cost.gpu_ms
        );
        self.scene = Some(cost);
    }

    async fn teardown_scene(&mut self) {
        if self.scene.take().is_some() {
            log::debug!("[SyntheticHost] Scene destroyed");
        }
    }

    async fn sample_frame(&mut self) -> HostFrame {
        let cost = self.scene.unwrap_or(SceneCost::EMPTY);
        let cpu_ms = cost.cpu_ms * self.rng.random_range(0.9..1.15);
        let gpu_ms = cost.gpu_ms * self.rng.random_range(0.9..1.15);
        let gpu_missing = self.rng.random_bool(GPU_DROPOUT);

        let frame_time = Duration::from_secs_f64(cpu_ms.max(gpu_ms) / 1000.0);
        tokio::time::sleep(frame_time.max(self.frame_budget)).await;

        if gpu_missing {
            HostFrame::cpu_only(cpu_ms)
        } else {
            HostFrame::new(cpu_ms, gpu_ms)
        }
    }

    fn environment_info(&self) -> EnvironmentInfo {
        self.environment.clone()
    }
}

fn detect_environment() -> EnvironmentInfo {
    let system = System::new_all();
    let device = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "Unknown CPU".to_string());

    EnvironmentInfo {
        platform: concat!("shaderbench ", env!("CARGO_PKG_VERSION")).to_string(),
        gpu_api: "Synthetic".to_string(),
        device,
        os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
    }
}
