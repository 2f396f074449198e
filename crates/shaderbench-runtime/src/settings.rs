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

//! The configuration file and its command-line overrides.

use crate::cli::Cli;
use crate::presets;
use anyhow::{Context, Result};
use serde::Deserialize;
use shaderbench_core::{BenchmarkCase, RunConfig};
use std::path::Path;

/// Everything a run needs, as read from a TOML file.
///
/// ```toml
/// [run]
/// measure_seconds = 10.0
///
/// [run.upload]
/// enabled = true
/// url = "https://example.invalid/exec"
///
/// [[cases]]
/// name = "Lit"
/// grid_x = 50
/// grid_y = 50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run parameters.
    pub run: RunConfig,
    /// Cases, in execution order.
    pub cases: Vec<BenchmarkCase>,
}

impl Settings {
    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))
    }

    /// Parses settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Applies command-line overrides on top of the file.
    pub fn apply(&mut self, cli: &Cli) {
        let run = &mut self.run;
        if let Some(warmup) = cli.warmup {
            run.warmup_seconds = warmup;
        }
        if let Some(measure) = cli.measure {
            run.measure_seconds = measure;
        }
        if let Some(repetitions) = cli.repetitions {
            run.repetitions = repetitions;
        }
        if let Some(target_fps) = cli.target_fps {
            run.target_fps = target_fps;
        }
        if let Some(seed) = cli.seed {
            run.seed = seed;
        }
        if let Some(output_dir) = &cli.output_dir {
            run.output_dir = output_dir.clone();
        }
        if let Some(label) = &cli.label {
            run.label.custom = Some(label.clone());
        }
        if let Some(token) = &cli.token {
            run.upload.token = token.clone();
        }
        if cli.no_upload {
            run.upload.enabled = false;
        }

        if cli.presets {
            self.cases.extend(presets::example_cases());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use shaderbench_core::{ConfigError, UploadPolicy};

    const SAMPLE: &str = r#"
[run]
warmup_seconds = 1.5
measure_seconds = 4.0
repetitions = 3
target_fps = 90

[run.upload]
enabled = true
url = "https://sink.invalid/exec"
policy = "batched"
batch_size = 8

[run.label]
prefix = "Quest_"

[[cases]]
name = "Lit"
grid_x = 20
grid_y = 30
enabled_keywords = "_EMISSION, _NORMALMAP"

[[cases]]
grid_x = 5
grid_y = 5
gpu_instancing = false
"#;

    #[test]
    fn test_parse_sample_file() {
        let settings = Settings::from_toml(SAMPLE).unwrap();
        let run = &settings.run;
        assert_eq!(run.warmup_seconds, 1.5);
        assert_eq!(run.repetitions, 3);
        assert_eq!(run.seed, RunConfig::default().seed);
        assert!(run.upload.enabled);
        assert_eq!(run.upload.policy, UploadPolicy::Batched);
        assert_eq!(run.flush_threshold(), 8);
        assert_eq!(run.label.prefix, "Quest_");
        assert!(run.label.new_sheet_per_run);

        assert_eq!(settings.cases.len(), 2);
        assert_eq!(settings.cases[0].enabled_keyword_list(), ["_EMISSION", "_NORMALMAP"]);
        assert_eq!(settings.cases[1].display_name(1), "Lit - Instancing ON");
        assert!(!settings.cases[1].gpu_instancing);
        assert!(run.validate(&settings.cases).is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut settings = Settings::from_toml(SAMPLE).unwrap();
        let cli = Cli::parse_from([
            "shaderbench",
            "--measure",
            "2",
            "--label",
            "nightly",
            "--token",
            "t0k",
            "--no-upload",
            "--presets",
        ]);

        settings.apply(&cli);

        assert_eq!(settings.run.measure_seconds, 2.0);
        assert_eq!(settings.run.warmup_seconds, 1.5);
        assert_eq!(settings.run.label.resolve("20250101_000000"), "Quest_nightly");
        assert_eq!(settings.run.upload.token, "t0k");
        assert!(!settings.run.upload.enabled);
        assert_eq!(settings.cases.len(), 5);
    }

    #[test]
    fn test_empty_case_list_is_rejected() {
        let mut settings = Settings::from_toml("[run]\nrepetitions = 2\n").unwrap();
        settings.apply(&Cli::parse_from(["shaderbench"]));

        assert!(settings.cases.is_empty());
        assert_eq!(
            settings.run.validate(&settings.cases),
            Err(ConfigError::NoCases)
        );
    }

    #[test]
    fn test_presets_flag_fills_an_empty_case_list() {
        let mut settings = Settings::default();
        settings.apply(&Cli::parse_from(["shaderbench", "--presets"]));
        assert_eq!(settings.cases.len(), 3);
        assert!(settings.run.validate(&settings.cases).is_ok());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = Settings::from_toml("[run.upload]\npolicy = \"sometimes\"\n");
        assert!(err.is_err());
    }
}
