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

//! Drives a render host through timed phases.

use crate::cancel::CancelToken;
use crate::phase::{ActivePhase, PhaseResult, PhaseSpec, PhaseStep, SampleBuffer, SchedulerState};
use crate::status::StatusHandle;
use shaderbench_core::{BenchmarkCase, RenderHost, Stopwatch};
use std::fmt;
use std::time::Duration;

/// Returned when a phase stopped because of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("run cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Runs warmup and measuring phases against a render host.
///
/// The scheduler suspends exactly once per rendered frame, inside
/// [`RenderHost::sample_frame`]. The cancellation token is checked before and
/// after every suspension, so a request is honoured within one frame.
#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    warmup: Duration,
    measurement: Duration,
    cancel: CancelToken,
    status: StatusHandle,
}

impl PhaseScheduler {
    /// Creates a scheduler with the given phase lengths.
    pub fn new(
        warmup: Duration,
        measurement: Duration,
        cancel: CancelToken,
        status: StatusHandle,
    ) -> Self {
        Self {
            warmup,
            measurement,
            cancel,
            status,
        }
    }

    /// Runs one phase until its duration has elapsed.
    ///
    /// A zero-length phase renders no frame.
    pub async fn run_phase<H>(
        &self,
        host: &mut H,
        spec: PhaseSpec,
    ) -> Result<PhaseResult, Cancelled>
    where
        H: RenderHost + ?Sized,
    {
        let mut phase = ActivePhase::new(spec);
        let watch = Stopwatch::new();
        self.enter(spec.state);
        self.status.update(|s| {
            s.phase_elapsed = Duration::ZERO;
            s.phase_duration = spec.duration;
        });
        log::debug!(
            "[Scheduler] {} started ({:.2}s)",
            spec.name(),
            spec.duration.as_secs_f64()
        );

        loop {
            if self.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            if phase.is_complete(watch.elapsed()) {
                break;
            }

            let frame = host.sample_frame().await;
            if self.cancel.is_cancelled() {
                return Err(Cancelled);
            }

            let elapsed = watch.elapsed();
            let (sample, step) = phase.tick(elapsed, frame);
            log::trace!(
                "[Scheduler] {} frame {}: cpu {:.3}ms gpu {:.3}ms",
                spec.name(),
                phase.frames(),
                sample.cpu_ms,
                sample.gpu_ms
            );
            self.status.update(|s| {
                s.phase_elapsed = elapsed;
                s.instant_cpu_ms = sample.cpu_ms;
                s.instant_gpu_ms = sample.gpu_ms;
                s.instant_fps = sample.fps();
            });

            if step == PhaseStep::Complete {
                break;
            }
        }

        let result = phase.finish(watch.elapsed());
        log::debug!(
            "[Scheduler] {} finished after {} frame(s), {} sample(s)",
            spec.name(),
            result.frames,
            result.samples.len()
        );
        Ok(result)
    }

    /// Builds the scene for `case`, runs warmup then measurement, and tears the scene down.
    ///
    /// The scene is torn down on cancellation as well, before the scheduler
    /// reports [`SchedulerState::Cancelled`].
    pub async fn run_repetition<H>(
        &self,
        host: &mut H,
        case: &BenchmarkCase,
    ) -> Result<SampleBuffer, Cancelled>
    where
        H: RenderHost + ?Sized,
    {
        host.build_scene(case).await;

        let measured = match self.run_phase(host, PhaseSpec::warmup(self.warmup)).await {
            Ok(_) => self.run_phase(host, PhaseSpec::measuring(self.measurement)).await,
            Err(cancelled) => Err(cancelled),
        };

        host.teardown_scene().await;
        match measured {
            Ok(result) => {
                self.enter(SchedulerState::Done);
                Ok(result.samples)
            }
            Err(cancelled) => {
                self.enter(SchedulerState::Cancelled);
                Err(cancelled)
            }
        }
    }

    /// Runs every repetition of `case` in order, one sample buffer per repetition.
    ///
    /// On cancellation the buffers of completed repetitions are dropped along
    /// with the interrupted one; callers that must keep them drive
    /// [`PhaseScheduler::run_repetition`] themselves.
    pub async fn run_case<H>(
        &self,
        host: &mut H,
        case: &BenchmarkCase,
        repetitions: u32,
    ) -> Result<Vec<SampleBuffer>, Cancelled>
    where
        H: RenderHost + ?Sized,
    {
        let mut buffers = Vec::with_capacity(repetitions as usize);
        for repetition in 1..=repetitions {
            self.status.update(|s| s.repetition = repetition);
            buffers.push(self.run_repetition(host, case).await?);
        }
        Ok(buffers)
    }

    /// Marks the scheduler cancelled without running anything.
    pub fn mark_cancelled(&self) {
        self.enter(SchedulerState::Cancelled);
    }

    fn enter(&self, next: SchedulerState) {
        self.status.update(|s| {
            if !s.phase.can_transition_to(next) {
                log::warn!("[Scheduler] Unexpected transition {} -> {}", s.phase, next);
            }
            s.phase = next;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shaderbench_core::{EnvironmentInfo, HostFrame};

    /// Renders a frame every 10ms with fixed timings and counts lifecycle calls.
    #[derive(Default)]
    struct FixedHost {
        built: u32,
        torn_down: u32,
        frames: u32,
        cancel_after: Option<(u32, CancelToken)>,
    }

    #[async_trait]
    impl RenderHost for FixedHost {
        async fn build_scene(&mut self, _case: &BenchmarkCase) {
            self.built += 1;
        }

        async fn teardown_scene(&mut self) {
            self.torn_down += 1;
        }

        async fn sample_frame(&mut self) -> HostFrame {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.frames += 1;
            if let Some((limit, token)) = &self.cancel_after {
                if self.frames >= *limit {
                    token.cancel();
                }
            }
            HostFrame::new(8.0, 4.0)
        }

        fn environment_info(&self) -> EnvironmentInfo {
            EnvironmentInfo::default()
        }
    }

    fn scheduler(
        warmup_ms: u64,
        measure_ms: u64,
    ) -> (PhaseScheduler, CancelToken, StatusHandle) {
        let cancel = CancelToken::new();
        let status = StatusHandle::new();
        let scheduler = PhaseScheduler::new(
            Duration::from_millis(warmup_ms),
            Duration::from_millis(measure_ms),
            cancel.clone(),
            status.clone(),
        );
        (scheduler, cancel, status)
    }

    #[tokio::test(start_paused = true)]
    async fn test_repetition_runs_warmup_then_measurement() {
        let (scheduler, _cancel, status) = scheduler(50, 100);
        let mut host = FixedHost::default();

        let samples = scheduler
            .run_repetition(&mut host, &BenchmarkCase::default())
            .await
            .unwrap();

        // 5 warmup frames (10ms each) and 10 measured frames.
        assert_eq!(host.frames, 15);
        assert_eq!(samples.len(), 10);
        assert_eq!((host.built, host.torn_down), (1, 1));
        assert_eq!(status.snapshot().phase, SchedulerState::Done);
        assert_eq!(status.snapshot().instant_cpu_ms, 8.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_warmup_renders_no_warmup_frame() {
        let (scheduler, _cancel, _status) = scheduler(0, 30);
        let mut host = FixedHost::default();

        let samples = scheduler
            .run_repetition(&mut host, &BenchmarkCase::default())
            .await
            .unwrap();

        assert_eq!(host.frames, 3);
        assert_eq!(samples.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_tears_down_scene() {
        let (scheduler, cancel, status) = scheduler(50, 1_000);
        let mut host = FixedHost {
            cancel_after: Some((8, cancel.clone())),
            ..Default::default()
        };

        let outcome = scheduler
            .run_repetition(&mut host, &BenchmarkCase::default())
            .await;

        assert_eq!(outcome, Err(Cancelled));
        assert_eq!(host.frames, 8, "no frame is requested after cancellation");
        assert_eq!(host.torn_down, 1);
        assert_eq!(status.snapshot().phase, SchedulerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_case_yields_one_buffer_per_repetition() {
        let (scheduler, _cancel, status) = scheduler(10, 20);
        let mut host = FixedHost::default();

        let buffers = scheduler
            .run_case(&mut host, &BenchmarkCase::default(), 3)
            .await
            .unwrap();

        assert_eq!(buffers.len(), 3);
        assert!(buffers.iter().all(|b| b.len() == 2));
        assert_eq!(host.built, 3);
        assert_eq!(status.snapshot().repetition, 3);
    }
}
