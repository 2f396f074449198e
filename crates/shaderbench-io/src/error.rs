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

//! Error types for the I/O layer.

use std::path::PathBuf;
use thiserror::Error;

/// An error raised by the pending-upload queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Reading or writing the durable snapshot failed.
    #[error("failed to access pending snapshot '{path}': {source}")]
    Io {
        /// Snapshot location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The durable snapshot exists but could not be parsed. It has been moved to `moved_to`.
    #[error("pending snapshot '{path}' is unreadable (moved to '{moved_to}'): {source}")]
    Corrupt {
        /// Snapshot location.
        path: PathBuf,
        /// Where the unreadable file was moved.
        moved_to: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The queue contents could not be encoded.
    #[error("failed to encode pending snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    /// More rows were committed than are pending.
    #[error("cannot commit {requested} rows, only {available} pending")]
    CommitOutOfRange {
        /// Rows the caller tried to commit.
        requested: usize,
        /// Rows actually pending.
        available: usize,
    },
}

/// An error raised while talking to the remote sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The request never produced a response (DNS, connection, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The sink answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// The sink answered 2xx but refused the request (e.g. token mismatch).
    #[error("rejected by sink: {0}")]
    Rejected(String),
}

/// An error raised by the local CSV result log.
#[derive(Debug, Error)]
#[error("failed to write result log '{path}': {source}")]
pub struct LogError {
    /// Log file location.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}
