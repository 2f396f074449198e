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

//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

/// Runs rendering benchmarks and delivers the results.
#[derive(Parser, Debug)]
#[command(name = "shaderbench", version, about)]
pub struct Cli {
    /// TOML file with `[run]` settings and `[[cases]]`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Append the built-in example cases.
    #[arg(long)]
    pub presets: bool,

    /// Warmup length per repetition, in seconds.
    #[arg(long)]
    pub warmup: Option<f64>,

    /// Measurement length per repetition, in seconds.
    #[arg(long)]
    pub measure: Option<f64>,

    /// Repetitions per case.
    #[arg(short, long)]
    pub repetitions: Option<u32>,

    /// Frame rate results are rated against.
    #[arg(long)]
    pub target_fps: Option<u32>,

    /// Seed for the synthetic render host.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for the CSV log and the pending-uploads snapshot.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Custom run label (appended to the label prefix).
    #[arg(long)]
    pub label: Option<String>,

    /// Shared secret for the sink.
    #[arg(long, env = "SHADERBENCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Keep results local even if the config enables uploads.
    #[arg(long)]
    pub no_upload: bool,

    /// Seconds between progress lines. Zero disables them.
    #[arg(long, default_value_t = 2.0)]
    pub progress_interval: f64,
}
