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

//! Drains the pending queue into the remote sink.

use crate::error::SinkError;
use crate::pending::PendingQueue;
use crate::sink::{Sink, SinkRequest};
use shaderbench_core::ResultRow;

/// Result of one [`Uploader::flush`] call.
#[derive(Debug)]
pub enum UploadOutcome {
    /// The queue was already empty.
    Idle,
    /// Every pending row was acknowledged.
    Drained {
        /// Requests sent.
        batches: usize,
        /// Rows committed.
        rows: usize,
    },
    /// A request failed. Rows acknowledged before it are committed, the rest stay queued.
    Failed {
        /// Rows committed before the failure.
        uploaded_rows: usize,
        /// Why the failing request was not acknowledged.
        error: SinkError,
    },
}

impl UploadOutcome {
    /// Whether the queue is empty after this flush.
    pub fn is_drained(&self) -> bool {
        !matches!(self, UploadOutcome::Failed { .. })
    }
}

/// Sends batches from the head of a [`PendingQueue`] and commits what the sink acknowledges.
///
/// A failed request is never retried within the same flush; the rows simply
/// wait for the next trigger. Because a row is only committed after its
/// acknowledgement, a crash between the two can make the sink see a row twice.
/// The sink deduplicates on [`ResultRow::dedup_key`].
pub struct Uploader {
    sink: Box<dyn Sink>,
    token: String,
    batch_size: usize,
    last_status: Option<String>,
}

impl Uploader {
    /// Creates an uploader sending at most `batch_size` rows per request.
    pub fn new(sink: Box<dyn Sink>, token: impl Into<String>, batch_size: usize) -> Self {
        Self {
            sink,
            token: token.into(),
            batch_size: batch_size.max(1),
            last_status: None,
        }
    }

    /// Drains `queue` head first until it is empty or a request fails.
    pub async fn flush(&mut self, queue: &mut PendingQueue) -> UploadOutcome {
        if queue.is_empty() {
            return UploadOutcome::Idle;
        }

        let mut batches = 0;
        let mut rows = 0;
        while !queue.is_empty() {
            let batch = same_label_prefix(queue.peek_batch(self.batch_size));
            let sheet_name = batch[0].run_label.clone();
            let count = batch.len();
            let request = SinkRequest::append(&self.token, &sheet_name, batch.to_vec());

            match self.sink.send(&request).await {
                Ok(()) => {
                    if let Err(e) = queue.commit(count) {
                        log::warn!("[Uploader] Uploaded rows could not be committed: {e}");
                    }
                    batches += 1;
                    rows += count;
                    log::info!("[Uploader] Uploaded {count} row(s) to '{sheet_name}'");
                    self.last_status = Some(format!("Uploaded {count} row(s) to '{sheet_name}'"));
                }
                Err(error) => {
                    log::warn!(
                        "[Uploader] Upload of {count} row(s) failed, {} row(s) remain pending: {error}",
                        queue.len()
                    );
                    self.last_status = Some(format!("Upload failed: {error}"));
                    return UploadOutcome::Failed {
                        uploaded_rows: rows,
                        error,
                    };
                }
            }
        }
        UploadOutcome::Drained { batches, rows }
    }

    /// Asks the sink to close out `run_label`.
    pub async fn finalize_run(
        &mut self,
        run_label: &str,
        target_fps: u32,
    ) -> Result<(), SinkError> {
        let request = SinkRequest::finalize(&self.token, run_label, target_fps);
        match self.sink.send(&request).await {
            Ok(()) => {
                log::info!("[Uploader] Finalized '{run_label}'");
                self.last_status = Some(format!("Finalized '{run_label}'"));
                Ok(())
            }
            Err(e) => {
                log::warn!("[Uploader] Finalize of '{run_label}' failed: {e}");
                self.last_status = Some(format!("Finalize failed: {e}"));
                Err(e)
            }
        }
    }

    /// Human-readable description of the last request's outcome.
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }
}

/// The leading rows that share the first row's run label.
fn same_label_prefix(rows: &[ResultRow]) -> &[ResultRow] {
    let Some(head) = rows.first() else {
        return rows;
    };
    let end = rows
        .iter()
        .position(|row| row.run_label != head.run_label)
        .unwrap_or(rows.len());
    &rows[..end]
}
