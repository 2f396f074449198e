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

//! Benchmark case definitions.

use serde::{Deserialize, Serialize};

/// Characters accepted as separators in free-text keyword lists.
const KEYWORD_SEPARATORS: &[char] = &[',', ';', '|', '\n', '\t', ' '];

/// One parameterized scenario to be benchmarked.
///
/// A case describes *what* the render host should build: a grid of instances with a
/// given spacing, plus the material and shadow flags applied to every instance.
/// Cases are immutable once loaded and are independent of the repetition count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkCase {
    /// Human-readable name shown in progress reports and written to every row.
    /// An empty name is replaced by `Case_<n>` (see [`BenchmarkCase::display_name`]).
    pub name: String,
    /// Number of instances along the X axis of the grid.
    pub grid_x: u32,
    /// Number of instances along the Y axis of the grid.
    pub grid_y: u32,
    /// Distance between two neighbouring instances, in world units.
    pub spacing: f32,
    /// Whether GPU instancing is enabled on the material.
    pub gpu_instancing: bool,
    /// Whether instances cast shadows.
    pub cast_shadows: bool,
    /// Whether instances receive shadows.
    pub receive_shadows: bool,
    /// Shader keywords to enable, as free text.
    pub enabled_keywords: String,
    /// Shader keywords to disable, as free text.
    pub disabled_keywords: String,
}

impl Default for BenchmarkCase {
    fn default() -> Self {
        Self {
            name: "Lit - Instancing ON".to_string(),
            grid_x: 50,
            grid_y: 50,
            spacing: 1.0,
            gpu_instancing: true,
            cast_shadows: true,
            receive_shadows: true,
            enabled_keywords: String::new(),
            disabled_keywords: String::new(),
        }
    }
}

impl BenchmarkCase {
    /// Returns the name used for this case, falling back to `Case_<index + 1>`
    /// when no name was configured.
    pub fn display_name(&self, index: usize) -> String {
        if self.name.trim().is_empty() {
            format!("Case_{}", index + 1)
        } else {
            self.name.clone()
        }
    }

    /// Total number of instances spawned for this case.
    pub fn instance_count(&self) -> u64 {
        u64::from(self.grid_x) * u64::from(self.grid_y)
    }

    /// The enabled keywords, split and trimmed.
    pub fn enabled_keyword_list(&self) -> Vec<&str> {
        split_keywords(&self.enabled_keywords)
    }

    /// The disabled keywords, split and trimmed.
    pub fn disabled_keyword_list(&self) -> Vec<&str> {
        split_keywords(&self.disabled_keywords)
    }
}

/// Splits a free-text keyword list on commas, semicolons, pipes and whitespace.
pub fn split_keywords(list: &str) -> Vec<&str> {
    list.split(KEYWORD_SEPARATORS)
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .collect()
}
