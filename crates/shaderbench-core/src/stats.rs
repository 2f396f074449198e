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

//! Reduction of per-frame timing samples into summary statistics.
//!
//! Everything in this module is pure: the same samples always produce the same
//! [`Stats`], which is what makes the results comparable across runs and devices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentile reported in every summary.
pub const REPORTED_PERCENTILE: f64 = 95.0;

/// Lower bound applied to a frame time before deriving an FPS figure from it.
const MIN_FRAME_MS: f64 = 0.0001;

/// A rating tolerates a worst-case frame time up to this multiple of the frame budget
/// before dropping from `Medium` to `Bad`.
const MEDIUM_BUDGET_FACTOR: f64 = 1.5;

/// Average, 95th percentile, minimum and maximum of one measured quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSummary {
    /// Arithmetic mean.
    pub avg: f64,
    /// 95th percentile, linearly interpolated between order statistics.
    pub p95: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

impl MetricSummary {
    /// Summarizes a non-empty slice. Returns the zero summary for an empty one.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Self {
            // Summation rounding can push the mean a few ulps outside the range.
            avg: avg.clamp(min, max),
            p95: percentile_sorted(&sorted, REPORTED_PERCENTILE).clamp(min, max),
            min,
            max,
        }
    }
}

/// Aggregate over the samples of one measuring phase.
///
/// For every non-empty sample set `min <= avg <= max` and `min <= p95 <= max`
/// hold for each of the three quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    /// CPU frame time, in milliseconds.
    pub cpu: MetricSummary,
    /// GPU frame time, in milliseconds.
    pub gpu: MetricSummary,
    /// Frames per second, derived per frame from the slower of CPU and GPU.
    pub fps: MetricSummary,
    /// Number of frames the summary was computed from.
    pub frames: usize,
}

impl Stats {
    /// Returns `true` if no frame contributed to these statistics.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

/// Reduces paired CPU/GPU samples into [`Stats`].
///
/// Only the common prefix of the two sequences is used, so an interrupted
/// sampling loop that recorded one side more often than the other still yields
/// consistent pairs. An empty window produces the zero-valued `Stats`.
pub fn reduce(cpu_samples: &[f64], gpu_samples: &[f64]) -> Stats {
    let m = cpu_samples.len().min(gpu_samples.len());
    if m == 0 {
        return Stats::default();
    }

    let cpu = &cpu_samples[..m];
    let gpu = &gpu_samples[..m];
    let fps: Vec<f64> = cpu
        .iter()
        .zip(gpu)
        .map(|(&c, &g)| fps_for_frame(c, g))
        .collect();

    Stats {
        cpu: MetricSummary::from_samples(cpu),
        gpu: MetricSummary::from_samples(gpu),
        fps: MetricSummary::from_samples(&fps),
        frames: m,
    }
}

/// Frame rate implied by one frame: the frame is as long as the slower of its CPU and GPU work.
pub fn fps_for_frame(cpu_ms: f64, gpu_ms: f64) -> f64 {
    1000.0 / cpu_ms.max(gpu_ms).max(MIN_FRAME_MS)
}

/// Computes the `p`-th percentile (0-100) of `samples`.
///
/// The samples are sorted ascending, the rank `p / 100 * (n - 1)` is computed and the
/// result is interpolated between the order statistics at `floor(rank)` and `ceil(rank)`.
/// Returns `0.0` for an empty slice.
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = (rank.floor() as usize).min(last);
    let hi = (rank.ceil() as usize).min(last);
    let t = rank - rank.floor();
    sorted[lo] + (sorted[hi] - sorted[lo]) * t
}

/// Which side dominates the 95th-percentile frame time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bottleneck {
    /// CPU time is the larger one.
    #[serde(rename = "CPU")]
    Cpu,
    /// GPU time is the larger one.
    #[serde(rename = "GPU")]
    Gpu,
    /// Both are equal.
    Balanced,
}

impl fmt::Display for Bottleneck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bottleneck::Cpu => "CPU",
            Bottleneck::Gpu => "GPU",
            Bottleneck::Balanced => "Balanced",
        })
    }
}

/// Qualitative verdict against the target frame budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    /// The worst p95 fits in the frame budget.
    Good,
    /// The worst p95 fits in 1.5 frame budgets.
    Medium,
    /// Anything slower.
    Bad,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rating::Good => "Good",
            Rating::Medium => "Medium",
            Rating::Bad => "Bad",
        })
    }
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Dominant side.
    pub bottleneck: Bottleneck,
    /// Verdict against the frame budget.
    pub rating: Rating,
    /// One-line human-readable summary.
    pub summary: String,
}

/// Frame budget in milliseconds at `target_fps`. A zero target counts as 1 FPS.
pub fn frame_budget_ms(target_fps: u32) -> f64 {
    1000.0 / f64::from(target_fps.max(1))
}

/// Classifies a phase against the budget of `target_fps`.
pub fn classify(stats: &Stats, target_fps: u32) -> Classification {
    let budget = frame_budget_ms(target_fps);
    let cpu = stats.cpu.p95;
    let gpu = stats.gpu.p95;

    let bottleneck = if cpu > gpu {
        Bottleneck::Cpu
    } else if gpu > cpu {
        Bottleneck::Gpu
    } else {
        Bottleneck::Balanced
    };

    let worst = cpu.max(gpu);
    let rating = if worst <= budget {
        Rating::Good
    } else if worst <= budget * MEDIUM_BUDGET_FACTOR {
        Rating::Medium
    } else {
        Rating::Bad
    };

    let summary = format!(
        "{bottleneck} bottleneck - p95 CPU {cpu:.2}ms / GPU {gpu:.2}ms vs {budget:.2}ms budget"
    );

    Classification {
        bottleneck,
        rating,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats_with_p95(cpu: f64, gpu: f64) -> Stats {
        Stats {
            cpu: MetricSummary {
                p95: cpu,
                ..Default::default()
            },
            gpu: MetricSummary {
                p95: gpu,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn assert_ordered(summary: &MetricSummary) {
        assert!(summary.min <= summary.avg, "{summary:?}");
        assert!(summary.avg <= summary.max, "{summary:?}");
        assert!(summary.min <= summary.p95, "{summary:?}");
        assert!(summary.p95 <= summary.max, "{summary:?}");
    }

    #[test]
    fn test_percentile_interpolates_between_order_statistics() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_relative_eq!(percentile(&values, 95.0), 9.55, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_sorts_its_input() {
        let values = [10.0, 1.0, 7.0, 3.0, 9.0, 2.0, 8.0, 4.0, 6.0, 5.0];
        assert_relative_eq!(percentile(&values, 95.0), 9.55, epsilon = 1e-12);
        assert_relative_eq!(percentile(&values, 50.0), 5.5, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_edge_cases() {
        assert_eq!(percentile(&[], 95.0), 0.0);
        assert_eq!(percentile(&[4.2], 95.0), 4.2);
        assert_eq!(percentile(&[1.0, 2.0], 0.0), 1.0);
        assert_eq!(percentile(&[1.0, 2.0], 100.0), 2.0);
    }

    #[test]
    fn test_reduce_empty_is_zero() {
        let stats = reduce(&[], &[]);
        assert_eq!(stats, Stats::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_reduce_uses_common_prefix() {
        let stats = reduce(&[10.0, 12.0, 14.0], &[5.0]);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.cpu.max, 10.0);
        assert_eq!(stats.gpu.max, 5.0);
        assert_relative_eq!(stats.fps.avg, 100.0);
    }

    #[test]
    fn test_fps_bound_by_slower_side() {
        // CPU bound on the first frame, GPU bound on the second.
        let stats = reduce(&[20.0, 5.0], &[10.0, 25.0]);
        assert_relative_eq!(stats.fps.max, 50.0);
        assert_relative_eq!(stats.fps.min, 40.0);
        assert_relative_eq!(stats.fps.avg, 45.0);
    }

    #[test]
    fn test_frame_budget() {
        assert_relative_eq!(frame_budget_ms(60), 16.666_666, epsilon = 1e-5);
        assert_relative_eq!(frame_budget_ms(0), 1000.0);
    }

    #[test]
    fn test_fps_survives_zero_frame_time() {
        assert!(fps_for_frame(0.0, 0.0).is_finite());
    }

    #[test]
    fn test_summary_ordering_holds() {
        let datasets: [&[f64]; 5] = [
            &[0.1, 0.1, 0.1],
            &[16.6, 17.1, 15.9, 30.2, 16.0, 16.2],
            &[1e-6, 1e6],
            &[3.3],
            &[0.7, 0.2, 0.9, 0.4, 0.4, 0.1, 0.8, 0.3, 0.6, 0.5, 0.55, 0.35],
        ];
        for data in datasets {
            let gpu: Vec<f64> = data.iter().map(|v| v * 0.8).collect();
            let stats = reduce(data, &gpu);
            assert_ordered(&stats.cpu);
            assert_ordered(&stats.gpu);
            assert_ordered(&stats.fps);
        }
    }

    #[test]
    fn test_classify_cpu_bound_good() {
        let c = classify(&stats_with_p95(10.0, 6.0), 60);
        assert_eq!(c.bottleneck, Bottleneck::Cpu);
        assert_eq!(c.rating, Rating::Good);
        assert!(c.summary.contains("CPU"));
        assert!(c.summary.contains("10.00ms"));
        assert!(c.summary.contains("6.00ms"));
    }

    #[test]
    fn test_classify_gpu_bound_bad() {
        let c = classify(&stats_with_p95(20.0, 30.0), 60);
        assert_eq!(c.bottleneck, Bottleneck::Gpu);
        assert_eq!(c.rating, Rating::Bad);
    }

    #[test]
    fn test_classify_medium_and_balanced() {
        let c = classify(&stats_with_p95(20.0, 20.0), 60);
        assert_eq!(c.bottleneck, Bottleneck::Balanced);
        assert_eq!(c.rating, Rating::Medium);
        assert!(c.summary.starts_with("Balanced"));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let stats = stats_with_p95(12.345, 11.0);
        assert_eq!(classify(&stats, 72), classify(&stats, 72));
    }

    #[test]
    fn test_classify_zero_target_fps_does_not_divide_by_zero() {
        let c = classify(&stats_with_p95(500.0, 100.0), 0);
        assert_eq!(c.rating, Rating::Good);
    }
}
