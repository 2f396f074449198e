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

//! Errors raised while validating a run before any phase executes.

use std::fmt;

/// A configuration problem that prevents a run from starting.
///
/// Configuration errors are the only hard stop of the harness: they are detected
/// before any scene is built, file is written or request is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The case list is empty.
    NoCases,
    /// A phase duration is negative, non-finite, or zero where a positive value is required.
    InvalidDuration {
        /// The configuration field holding the duration.
        field: &'static str,
        /// The rejected value, in seconds.
        value: f64,
    },
    /// The repetition count is zero.
    ZeroRepetitions,
    /// The target frame rate is zero.
    ZeroTargetFps,
    /// The upload batch size is zero.
    ZeroBatchSize,
    /// Uploading is enabled but no sink URL was configured.
    MissingSinkUrl,
    /// A case has parameters the render host cannot build.
    InvalidCase {
        /// Position of the case in the case list.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoCases => write!(f, "No benchmark cases configured"),
            ConfigError::InvalidDuration { field, value } => {
                write!(f, "Invalid duration for '{field}': {value}s")
            }
            ConfigError::ZeroRepetitions => write!(f, "Repetition count must be at least 1"),
            ConfigError::ZeroTargetFps => write!(f, "Target FPS must be at least 1"),
            ConfigError::ZeroBatchSize => write!(f, "Upload batch size must be at least 1"),
            ConfigError::MissingSinkUrl => {
                write!(f, "Uploading is enabled but no sink URL is configured")
            }
            ConfigError::InvalidCase { index, reason } => {
                write!(f, "Case #{} is invalid: {reason}", index + 1)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
