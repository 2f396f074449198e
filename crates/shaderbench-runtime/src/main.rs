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

//! ShaderBench command-line runner.

mod cli;
mod presets;
mod settings;
mod synthetic_host;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use settings::Settings;
use shaderbench_control::{CancelToken, RunController, RunOutcome, StatusHandle};
use shaderbench_io::HttpSink;
use std::time::Duration;
use synthetic_host::SyntheticHost;

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("hyper", log::LevelFilter::Warn)
        .init();

    let cli = Cli::parse();
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply(&cli);

    let run_config = settings.run.clone();
    let host = SyntheticHost::new(run_config.seed, run_config.frame_budget_ms());
    let mut controller = RunController::new(settings.run, settings.cases, host)
        .context("invalid benchmark configuration")?;

    if run_config.upload.enabled {
        let sink = HttpSink::new(
            run_config.upload.url.clone(),
            Duration::from_secs(run_config.upload.timeout_seconds),
        )
        .context("failed to build the HTTP sink client")?;
        log::info!("Uploading results to '{}'", sink.url());
        controller = controller.with_sink(Box::new(sink));
    }

    spawn_ctrl_c_handler(controller.cancel_token());
    let progress = spawn_progress_reporter(controller.status_handle(), cli.progress_interval);

    let report = controller.run().await;
    if let Some(progress) = progress {
        progress.abort();
    }

    match report.outcome {
        RunOutcome::Completed => log::info!(
            "Run '{}' finished: {} row(s) recorded{}",
            report.run_label,
            report.rows.len(),
            if report.finalized { ", sink finalized" } else { "" }
        ),
        RunOutcome::Cancelled => log::warn!(
            "Run '{}' cancelled: {} row(s) recorded",
            report.run_label,
            report.rows.len()
        ),
    }
    if let Some(path) = &report.log_path {
        log::info!("Results written to '{}'", path.display());
    }
    if report.pending_rows > 0 {
        log::warn!(
            "{} row(s) are still pending upload and will be retried on the next run",
            report.pending_rows
        );
    }
    Ok(())
}

fn spawn_ctrl_c_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => cancel.cancel(),
            Err(e) => log::warn!("Ctrl-C handler unavailable: {e}"),
        }
    });
}

fn spawn_progress_reporter(
    status: StatusHandle,
    interval_secs: f64,
) -> Option<tokio::task::JoinHandle<()>> {
    let period = Duration::try_from_secs_f64(interval_secs)
        .ok()
        .filter(|d| !d.is_zero())?;

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let s = status.snapshot();
            if s.has_finished {
                break;
            }
            if !s.is_running || !s.phase.is_active() {
                continue;
            }
            log::info!(
                "[{}/{}] {} rep {}/{} | {} {:.1}s/{:.1}s | {:.1} FPS (CPU {:.2}ms, GPU {:.2}ms) | {} pending",
                s.case_index,
                s.total_cases,
                s.case_name,
                s.repetition,
                s.repetitions,
                s.phase,
                s.phase_elapsed.as_secs_f64(),
                s.phase_duration.as_secs_f64(),
                s.instant_fps,
                s.instant_cpu_ms,
                s.instant_gpu_ms,
                s.pending_uploads
            );
        }
    }))
}
