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

//! The render host contract.
//!
//! The harness never renders anything itself. Scene construction, frame
//! submission and GPU timing queries belong to a render host, which the
//! orchestration layer drives through the [`RenderHost`] trait.

use crate::case::BenchmarkCase;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Timing reported by the host for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostFrame {
    /// CPU time spent on the frame, in milliseconds.
    pub cpu_ms: f64,
    /// GPU time spent on the frame, in milliseconds, if the host could measure it.
    pub gpu_ms: Option<f64>,
    /// `false` when the host had no timing data for this frame at all.
    pub frame_valid: bool,
}

impl HostFrame {
    /// A frame with both CPU and GPU timings.
    pub fn new(cpu_ms: f64, gpu_ms: f64) -> Self {
        Self {
            cpu_ms,
            gpu_ms: Some(gpu_ms),
            frame_valid: true,
        }
    }

    /// A frame for which no GPU timing was available.
    pub fn cpu_only(cpu_ms: f64) -> Self {
        Self {
            cpu_ms,
            gpu_ms: None,
            frame_valid: true,
        }
    }

    /// A frame rendered without any timing information.
    pub fn invalid() -> Self {
        Self {
            cpu_ms: 0.0,
            gpu_ms: None,
            frame_valid: false,
        }
    }
}

/// Description of the device and graphics stack the run executes on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Engine or runtime identifier.
    #[serde(rename = "Platform")]
    pub platform: String,
    /// Graphics API in use (e.g. "Vulkan", "Metal").
    #[serde(rename = "GraphicsAPI")]
    pub gpu_api: String,
    /// Device model.
    #[serde(rename = "DeviceModel")]
    pub device: String,
    /// Operating system.
    #[serde(rename = "OS")]
    pub os: String,
}

/// A render engine that can be benchmarked.
///
/// All calls happen from a single logical thread of control: the harness never
/// builds two scenes at once and never samples while a scene is being built.
#[async_trait]
pub trait RenderHost: Send {
    /// Spawns everything described by `case`, replacing any previous scene.
    async fn build_scene(&mut self, case: &BenchmarkCase);

    /// Destroys the current scene. Must be a no-op when no scene exists.
    async fn teardown_scene(&mut self);

    /// Suspends until the next frame has been rendered and returns its timing.
    async fn sample_frame(&mut self) -> HostFrame;

    /// Returns the environment metadata attached to every result row.
    fn environment_info(&self) -> EnvironmentInfo;
}
