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

//! The per-frame phase model.
//!
//! An [`ActivePhase`] is advanced by one [`ActivePhase::tick`] per rendered
//! frame. Completion is decided by the wall-clock time handed to each tick,
//! never by counting frames, so the model is independent of the host's frame
//! rate and can be driven entirely from tests.

use shaderbench_core::{stats, HostFrame, Stats};
use std::fmt;
use std::time::Duration;

/// States of the phase scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Nothing has started yet.
    #[default]
    Idle,
    /// Frames are rendered but not recorded.
    Warmup,
    /// Frames are rendered and recorded.
    Measuring,
    /// The last repetition finished normally.
    Done,
    /// The run was cancelled. Terminal.
    Cancelled,
}

impl SchedulerState {
    /// Display name used in logs and progress reports.
    pub fn name(self) -> &'static str {
        match self {
            SchedulerState::Idle => "Idle",
            SchedulerState::Warmup => "Warmup",
            SchedulerState::Measuring => "Measuring",
            SchedulerState::Done => "Done",
            SchedulerState::Cancelled => "Cancelled",
        }
    }

    /// Whether the scheduler may move from `self` to `next`.
    ///
    /// `Done` may start another repetition. Cancellation is reachable from
    /// every state except itself.
    pub fn can_transition_to(self, next: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, next),
            (Idle | Done, Warmup)
                | (Warmup, Measuring)
                | (Measuring, Done)
                | (Idle | Warmup | Measuring | Done, Cancelled)
        )
    }

    /// Whether a phase is in progress.
    pub fn is_active(self) -> bool {
        matches!(self, SchedulerState::Warmup | SchedulerState::Measuring)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of one timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    /// `Warmup` or `Measuring`.
    pub state: SchedulerState,
    /// Wall-clock length of the phase.
    pub duration: Duration,
    /// Whether frame samples are kept.
    pub collect_samples: bool,
}

impl PhaseSpec {
    /// A warmup phase. Warmup never collects samples.
    pub fn warmup(duration: Duration) -> Self {
        Self {
            state: SchedulerState::Warmup,
            duration,
            collect_samples: false,
        }
    }

    /// A measuring phase.
    pub fn measuring(duration: Duration) -> Self {
        Self {
            state: SchedulerState::Measuring,
            duration,
            collect_samples: true,
        }
    }

    /// Display name of the phase.
    pub fn name(&self) -> &'static str {
        self.state.name()
    }
}

/// One frame's timing after fail-soft substitution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// CPU frame time, in milliseconds.
    pub cpu_ms: f64,
    /// GPU frame time, in milliseconds.
    pub gpu_ms: f64,
}

impl Sample {
    /// Converts a host frame into a sample.
    ///
    /// A frame without usable CPU timing falls back to `wall_delta_ms`, the
    /// wall-clock time since the previous frame. A frame without usable GPU
    /// timing reuses the CPU figure.
    pub fn from_frame(frame: HostFrame, wall_delta_ms: f64) -> Self {
        let cpu_ms = if frame.frame_valid && usable(frame.cpu_ms) {
            frame.cpu_ms
        } else {
            wall_delta_ms.max(0.0)
        };
        let gpu_ms = match frame.gpu_ms {
            Some(gpu) if frame.frame_valid && usable(gpu) => gpu,
            _ => cpu_ms,
        };
        Self { cpu_ms, gpu_ms }
    }

    /// Frame rate implied by this sample.
    pub fn fps(&self) -> f64 {
        stats::fps_for_frame(self.cpu_ms, self.gpu_ms)
    }
}

fn usable(ms: f64) -> bool {
    ms.is_finite() && ms > 0.0
}

/// The samples recorded during one measuring phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    cpu: Vec<f64>,
    gpu: Vec<f64>,
}

impl SampleBuffer {
    /// Appends one sample.
    pub fn push(&mut self, sample: Sample) {
        self.cpu.push(sample.cpu_ms);
        self.gpu.push(sample.gpu_ms);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.cpu.len().min(self.gpu.len())
    }

    /// Whether no sample was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CPU frame times, in recording order.
    pub fn cpu(&self) -> &[f64] {
        &self.cpu
    }

    /// GPU frame times, in recording order.
    pub fn gpu(&self) -> &[f64] {
        &self.gpu
    }

    /// Reduces the buffer into summary statistics.
    pub fn reduce(&self) -> Stats {
        stats::reduce(&self.cpu, &self.gpu)
    }
}

/// Whether a phase wants another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStep {
    /// The phase needs more frames.
    Continue,
    /// The phase duration has elapsed.
    Complete,
}

/// What a finished phase produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseResult {
    /// `Warmup` or `Measuring`.
    pub state: SchedulerState,
    /// Wall-clock time the phase actually took.
    pub elapsed: Duration,
    /// Frames rendered during the phase, recorded or not.
    pub frames: u64,
    /// Recorded samples. Always empty for warmup.
    pub samples: SampleBuffer,
}

/// A phase in progress.
#[derive(Debug, Clone)]
pub struct ActivePhase {
    spec: PhaseSpec,
    samples: SampleBuffer,
    frames: u64,
    last_tick: Duration,
}

impl ActivePhase {
    /// Starts a phase. No frame has been seen yet.
    pub fn new(spec: PhaseSpec) -> Self {
        Self {
            spec,
            samples: SampleBuffer::default(),
            frames: 0,
            last_tick: Duration::ZERO,
        }
    }

    /// The phase being run.
    pub fn spec(&self) -> &PhaseSpec {
        &self.spec
    }

    /// Frames seen so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether the phase is over at `elapsed` since its start.
    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.spec.duration
    }

    /// Accounts for one rendered frame observed `elapsed` after the phase started.
    pub fn tick(&mut self, elapsed: Duration, frame: HostFrame) -> (Sample, PhaseStep) {
        let wall_delta = elapsed.saturating_sub(self.last_tick);
        self.last_tick = elapsed;
        self.frames += 1;

        let sample = Sample::from_frame(frame, wall_delta.as_secs_f64() * 1000.0);
        if self.spec.collect_samples {
            self.samples.push(sample);
        }

        let step = if self.is_complete(elapsed) {
            PhaseStep::Complete
        } else {
            PhaseStep::Continue
        };
        (sample, step)
    }

    /// Closes the phase.
    pub fn finish(self, elapsed: Duration) -> PhaseResult {
        PhaseResult {
            state: self.spec.state,
            elapsed,
            frames: self.frames,
            samples: self.samples,
        }
    }
}
