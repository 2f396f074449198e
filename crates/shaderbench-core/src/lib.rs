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

//! # ShaderBench Core
//!
//! Foundational crate containing the data model, the statistics reducer and the
//! contract of the render host that every other ShaderBench crate builds upon.
//!
//! Nothing in here performs I/O: durable storage and the remote sink live in
//! `shaderbench-io`, orchestration lives in `shaderbench-control`.

#![warn(missing_docs)]

pub mod case;
pub mod config;
pub mod error;
pub mod host;
pub mod row;
pub mod stats;
pub mod timer;

pub use case::BenchmarkCase;
pub use config::{RunConfig, RunLabelConfig, UploadConfig, UploadPolicy};
pub use error::ConfigError;
pub use host::{EnvironmentInfo, HostFrame, RenderHost};
pub use row::{ResultRow, RowMeta};
pub use stats::{Bottleneck, Classification, MetricSummary, Rating, Stats};
pub use timer::Stopwatch;
