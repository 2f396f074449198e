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

//! The remote sink protocol and its HTTP client.

use crate::error::SinkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shaderbench_core::ResultRow;
use std::time::Duration;

/// What a request asks the sink to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SinkAction {
    /// Append rows to the named sheet. The sink treats
    /// (run label, case name, repetition) as the deduplication key.
    Append {
        /// Rows, in queue order.
        rows: Vec<ResultRow>,
    },
    /// Close out the named sheet: the sink computes its summary view.
    Finalize {
        /// Target frame rate the summary should be judged against.
        #[serde(rename = "targetFps")]
        target_fps: u32,
    },
}

/// A complete request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkRequest {
    /// Shared secret checked by the sink.
    pub token: String,
    /// Run label the request applies to.
    #[serde(rename = "sheetName")]
    pub sheet_name: String,
    /// The action and its payload.
    #[serde(flatten)]
    pub action: SinkAction,
}

impl SinkRequest {
    /// An `append` request.
    pub fn append(token: &str, sheet_name: &str, rows: Vec<ResultRow>) -> Self {
        Self {
            token: token.to_string(),
            sheet_name: sheet_name.to_string(),
            action: SinkAction::Append { rows },
        }
    }

    /// A `finalize` request.
    pub fn finalize(token: &str, sheet_name: &str, target_fps: u32) -> Self {
        Self {
            token: token.to_string(),
            sheet_name: sheet_name.to_string(),
            action: SinkAction::Finalize { target_fps },
        }
    }
}

/// A destination that accepts appended rows and close-out requests.
///
/// Success means the sink acknowledged the whole request. Any error means
/// nothing may be assumed about what the sink stored.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Sends one request and waits for the acknowledgement.
    async fn send(&self, request: &SinkRequest) -> Result<(), SinkError>;
}

#[derive(Debug, Deserialize)]
struct SinkReply {
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

const MAX_ERROR_BODY: usize = 512;

/// A [`Sink`] that POSTs JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    /// Builds a client for `url` with the given request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shaderbench/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpoint the sink posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn send(&self, request: &SinkRequest) -> Result<(), SinkError> {
        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SinkError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }
        check_reply(&body)
    }
}

/// Interprets a 2xx response body. Bodies that are not JSON count as success.
fn check_reply(body: &str) -> Result<(), SinkError> {
    match serde_json::from_str::<SinkReply>(body) {
        Ok(SinkReply {
            ok: Some(false),
            error,
        }) => Err(SinkError::Rejected(
            error.unwrap_or_else(|| "no reason given".to_string()),
        )),
        _ => Ok(()),
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
