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

//! The write-through queue of rows not yet acknowledged by the remote sink.
//!
//! Every mutation is immediately mirrored to a JSON snapshot on disk, so a
//! crash between two uploads loses nothing. The snapshot is written to a
//! temporary file next to the target and then renamed over it.

use crate::error::QueueError;
use serde::{Deserialize, Serialize};
use shaderbench_core::ResultRow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the durable snapshot inside the output directory.
pub const PENDING_FILE_NAME: &str = "ShaderBench_PendingUploads.json";

#[derive(Serialize)]
struct Snapshot<'a> {
    token: &'a str,
    #[serde(rename = "sheetName")]
    sheet_name: &'a str,
    rows: &'a [ResultRow],
}

#[derive(Deserialize)]
struct StoredSnapshot {
    #[serde(rename = "sheetName", default)]
    sheet_name: String,
    #[serde(default)]
    rows: Vec<ResultRow>,
}

impl StoredSnapshot {
    /// Rows saved without their own label belong to the snapshot's sheet.
    fn into_rows(self) -> Vec<ResultRow> {
        let Self {
            sheet_name,
            mut rows,
        } = self;
        if !sheet_name.is_empty() {
            for row in rows.iter_mut().filter(|r| r.run_label.is_empty()) {
                row.run_label = sheet_name.clone();
            }
        }
        rows
    }
}

/// An ordered FIFO of result rows awaiting upload.
#[derive(Debug)]
pub struct PendingQueue {
    rows: Vec<ResultRow>,
    path: PathBuf,
    token: String,
    sheet_name: String,
}

impl PendingQueue {
    /// Creates an empty queue backed by the snapshot at `path`. Nothing is read or written yet.
    pub fn new(
        path: impl Into<PathBuf>,
        token: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            rows: Vec::new(),
            path: path.into(),
            token: token.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// Replaces the in-memory queue with the contents of the durable snapshot.
    ///
    /// A missing snapshot yields an empty queue. An unparsable snapshot is moved
    /// aside to `<path>.corrupt` so that the next save starts clean, and the
    /// queue stays empty. Returns the number of recovered rows.
    pub fn load_from_durable(&mut self) -> Result<usize, QueueError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.rows.clear();
                return Ok(0);
            }
            Err(source) => {
                return Err(QueueError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str::<StoredSnapshot>(&text) {
            Ok(snapshot) => {
                self.rows = snapshot.into_rows();
                log::debug!(
                    "Loaded {} pending row(s) from '{}'",
                    self.rows.len(),
                    self.path.display()
                );
                Ok(self.rows.len())
            }
            Err(source) => {
                self.rows.clear();
                let moved_to = corrupt_path(&self.path);
                fs::rename(&self.path, &moved_to).map_err(|source| QueueError::Io {
                    path: self.path.clone(),
                    source,
                })?;
                Err(QueueError::Corrupt {
                    path: self.path.clone(),
                    moved_to,
                    source,
                })
            }
        }
    }

    /// Writes the whole queue to the durable snapshot, atomically replacing the previous one.
    pub fn save_to_durable(&self) -> Result<(), QueueError> {
        let io_err = |source| QueueError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(io_err)?;

        let snapshot = Snapshot {
            token: &self.token,
            sheet_name: &self.sheet_name,
            rows: &self.rows,
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Appends a row at the tail and persists the queue.
    ///
    /// The row stays queued in memory even when the save fails; the error is
    /// returned so the caller can report it.
    pub fn enqueue(&mut self, row: ResultRow) -> Result<(), QueueError> {
        self.rows.push(row);
        self.save_to_durable()
    }

    /// Returns up to `n` rows from the head without removing them.
    pub fn peek_batch(&self, n: usize) -> &[ResultRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Removes the first `n` rows and persists the queue.
    ///
    /// Only called after the sink acknowledged exactly those rows.
    pub fn commit(&mut self, n: usize) -> Result<(), QueueError> {
        if n > self.rows.len() {
            return Err(QueueError::CommitOutOfRange {
                requested: n,
                available: self.rows.len(),
            });
        }
        self.rows.drain(..n);
        self.save_to_durable()
    }

    /// Number of pending rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All pending rows, head first.
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Location of the durable snapshot.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}
