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

//! # ShaderBench Control
//!
//! Orchestration of a benchmark run. The [`PhaseScheduler`] drives one render
//! host through warmup and measuring phases, and the [`RunController`] strings
//! cases and repetitions together, records rows and keeps the sink in sync.

#![warn(missing_docs)]

pub mod cancel;
pub mod controller;
pub mod phase;
pub mod scheduler;
pub mod status;

pub use cancel::CancelToken;
pub use controller::{RunController, RunOutcome, RunReport};
pub use phase::{
    ActivePhase, PhaseResult, PhaseSpec, PhaseStep, Sample, SampleBuffer, SchedulerState,
};
pub use scheduler::{Cancelled, PhaseScheduler};
pub use status::{RunStatus, StatusHandle};
