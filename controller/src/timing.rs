//! Per-frame processing time instrumentation.
//!
//! Tracks how long each `process_frame` call took and keeps rolling
//! percentiles against the frame budget.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// Maximum number of samples to keep.
    pub window: usize,
    /// Frame budget in milliseconds (33 ms at 30 fps).
    pub budget_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            window: 1000,
            budget_ms: 33.0,
        }
    }
}

/// Rolling frame timing statistics over a window of samples.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    pub config: TimingConfig,
    /// Per-frame processing time, ms.
    samples: VecDeque<f64>,
    /// Total frames recorded.
    pub total_frames: u64,
    /// Frames that exceeded the budget.
    pub over_budget: u64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}

impl FrameTiming {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            samples: VecDeque::with_capacity(config.window),
            config,
            total_frames: 0,
            over_budget: 0,
        }
    }

    /// Record one frame's processing time.
    pub fn record(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.samples.push_back(ms);
        while self.samples.len() > self.config.window.max(1) {
            self.samples.pop_front();
        }
        self.total_frames += 1;
        if ms > self.config.budget_ms {
            self.over_budget += 1;
            warn!(
                "Frame over budget: {:.1}ms > {:.1}ms",
                ms, self.config.budget_ms
            );
        }
    }

    /// Percentile from a sorted slice.
    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p / 100.0).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn stats(&self) -> FrameTimingStats {
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        FrameTimingStats {
            p50: Self::percentile(&sorted, 50.0),
            p95: Self::percentile(&sorted, 95.0),
            p99: Self::percentile(&sorted, 99.0),
            max: sorted.last().copied().unwrap_or(0.0),
            over_budget_pct: if self.total_frames > 0 {
                (self.over_budget as f64 / self.total_frames as f64) * 100.0
            } else {
                0.0
            },
            total_frames: self.total_frames,
            over_budget: self.over_budget,
        }
    }

    /// Format stats as an s-expression for IPC.
    pub fn stats_sexp(&self) -> String {
        let s = self.stats();
        format!(
            "(:p50-ms {:.2} :p95-ms {:.2} :p99-ms {:.2} :max-ms {:.2} :budget-ms {:.1} :over-budget {} :over-budget-pct {:.1} :total-frames {})",
            s.p50, s.p95, s.p99, s.max, self.config.budget_ms,
            s.over_budget, s.over_budget_pct, s.total_frames,
        )
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.total_frames = 0;
        self.over_budget = 0;
    }
}

/// Computed frame timing statistics, ms.
#[derive(Debug, Clone)]
pub struct FrameTimingStats {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
    pub over_budget_pct: f64,
    pub total_frames: u64,
    pub over_budget: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn make_timing(window: usize) -> FrameTiming {
        FrameTiming::new(TimingConfig {
            window,
            budget_ms: 33.0,
        })
    }

    #[test]
    fn test_empty_stats() {
        let ft = FrameTiming::default();
        let stats = ft.stats();
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.p50, 0.0);
    }

    #[test]
    fn test_over_budget_detection() {
        let mut ft = make_timing(100);
        ft.record(ms(40));
        assert_eq!(ft.over_budget, 1);
        ft.record(ms(5));
        assert_eq!(ft.over_budget, 1);
        assert_eq!(ft.total_frames, 2);
        assert!((ft.stats().over_budget_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentiles() {
        let mut ft = make_timing(100);
        for v in 1..=100 {
            ft.record(ms(v % 30 + 1));
        }
        let stats = ft.stats();
        assert!(stats.p50 <= stats.p95 && stats.p95 <= stats.p99);
        assert!((stats.max - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_trim() {
        let mut ft = make_timing(5);
        for v in 0..10 {
            ft.record(ms(v));
        }
        assert_eq!(ft.samples.len(), 5);
        assert_eq!(ft.total_frames, 10);
        assert!((ft.stats().p50 - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_shrink_drops_oldest() {
        let mut ft = make_timing(10);
        for v in 1..=10 {
            ft.record(ms(v));
        }
        ft.config.window = 3;
        ft.record(ms(11));
        assert_eq!(ft.samples.len(), 3);
        assert_eq!(ft.samples.front().copied(), Some(9.0), "oldest samples dropped first");
        assert!((ft.stats().max - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_sexp_format() {
        let mut ft = make_timing(100);
        ft.record(ms(2));
        let sexp = ft.stats_sexp();
        assert!(sexp.starts_with("(:p50-ms 2.00"), "got {}", sexp);
        assert!(sexp.contains(":total-frames 1"));
        ft.reset();
        assert_eq!(ft.stats().total_frames, 0);
    }
}
