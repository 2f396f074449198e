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

//! # ShaderBench I/O
//!
//! Everything that leaves the process: the append-only CSV result log, the
//! write-through pending-upload queue and the client for the remote sink.

#![warn(missing_docs)]

pub mod error;
pub mod pending;
pub mod result_log;
pub mod sink;
pub mod uploader;

pub use error::{LogError, QueueError, SinkError};
pub use pending::PendingQueue;
pub use result_log::ResultLog;
pub use sink::{HttpSink, Sink, SinkAction, SinkRequest};
pub use uploader::{UploadOutcome, Uploader};
