//! Sliding-window performance metrics.
//!
//! Tracks per-frame processing latency and inter-arrival time over a fixed
//! number of recent samples, plus a monotonic dropped-frame counter. Shared
//! by every session; all access goes through one mutex so snapshots are
//! never torn and `reset` is atomic with respect to concurrent readers.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use sysinfo::System;
use tracing::info;

use face3d_models::MetricsSnapshot;

/// Token returned by [`MetricsWindow::record_start`]; carries the start
/// instant back into [`MetricsWindow::record_end`].
#[derive(Debug)]
pub struct FrameTimer {
    started: Instant,
}

/// Fixed-size sliding-window aggregator of per-frame timing.
pub struct MetricsWindow {
    log_interval: u64,
    inner: Mutex<WindowState>,
}

struct WindowState {
    capacity: usize,
    processing_ms: VecDeque<f64>,
    inter_arrival_ms: VecDeque<f64>,
    frame_count: u64,
    dropped_frames: u64,
    last_frame_at: Instant,
    host: System,
}

impl MetricsWindow {
    /// Create a window retaining `window_size` samples, logging every
    /// `log_interval` successful frames.
    pub fn new(window_size: usize, log_interval: u64) -> Self {
        let capacity = window_size.max(1);
        Self {
            log_interval: log_interval.max(1),
            inner: Mutex::new(WindowState {
                capacity,
                processing_ms: VecDeque::with_capacity(capacity),
                inter_arrival_ms: VecDeque::with_capacity(capacity),
                frame_count: 0,
                dropped_frames: 0,
                last_frame_at: Instant::now(),
                host: System::new(),
            }),
        }
    }

    /// Mark the start of a frame attempt.
    pub fn record_start(&self) -> FrameTimer {
        FrameTimer {
            started: Instant::now(),
        }
    }

    /// Mark the end of a frame attempt, folding measured durations into the
    /// window. Failed attempts (skips, decode/detection/inference failures)
    /// only advance the dropped counter.
    pub fn record_end(&self, timer: FrameTimer, success: bool) {
        let now = Instant::now();
        let processing_ms = now.duration_since(timer.started).as_secs_f64() * 1000.0;
        let mut state = self.lock();
        let inter_arrival_ms = now.duration_since(state.last_frame_at).as_secs_f64() * 1000.0;
        state.last_frame_at = now;
        self.fold_sample(&mut state, processing_ms, inter_arrival_ms, success);
    }

    /// Fold an explicit sample into the window.
    ///
    /// [`record_end`](Self::record_end) is the normal entry point; this
    /// exists for callers that measured durations themselves.
    pub fn record_sample(&self, processing_ms: f64, inter_arrival_ms: f64, success: bool) {
        let mut state = self.lock();
        state.last_frame_at = Instant::now();
        self.fold_sample(&mut state, processing_ms, inter_arrival_ms, success);
    }

    fn fold_sample(
        &self,
        state: &mut WindowState,
        processing_ms: f64,
        inter_arrival_ms: f64,
        success: bool,
    ) {
        if !success {
            state.dropped_frames += 1;
            return;
        }
        if state.processing_ms.len() == state.capacity {
            state.processing_ms.pop_front();
            state.inter_arrival_ms.pop_front();
        }
        state.processing_ms.push_back(processing_ms);
        state.inter_arrival_ms.push_back(inter_arrival_ms);
        state.frame_count += 1;

        if state.frame_count % self.log_interval == 0 {
            Self::log_window(state);
        }
    }

    /// Current aggregate view. An empty window reports zeros.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        if state.processing_ms.is_empty() {
            return MetricsSnapshot {
                dropped_frames: state.dropped_frames,
                ..MetricsSnapshot::default()
            };
        }

        let mean_arrival = mean(&state.inter_arrival_ms);
        let fps = if mean_arrival > 0.0 {
            1000.0 / mean_arrival
        } else {
            0.0
        };

        MetricsSnapshot {
            fps,
            avg_latency_ms: mean(&state.processing_ms),
            min_latency_ms: fold_min(&state.processing_ms),
            max_latency_ms: fold_max(&state.processing_ms),
            dropped_frames: state.dropped_frames,
        }
    }

    /// Clear the window and the dropped counter. Concurrent `snapshot`
    /// callers observe either the old state or the cleared one, never a
    /// mixture.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.processing_ms.clear();
        state.inter_arrival_ms.clear();
        state.frame_count = 0;
        state.dropped_frames = 0;
        state.last_frame_at = Instant::now();
        info!("Performance metrics reset");
    }

    fn log_window(state: &mut WindowState) {
        let mean_arrival = mean(&state.inter_arrival_ms);
        let fps = if mean_arrival > 0.0 {
            1000.0 / mean_arrival
        } else {
            0.0
        };
        // Host utilization is sampled here only; it never enters the window
        state.host.refresh_cpu_usage();
        state.host.refresh_memory();
        let cpu_percent = state.host.global_cpu_usage();
        let memory_percent = if state.host.total_memory() > 0 {
            state.host.used_memory() as f64 / state.host.total_memory() as f64 * 100.0
        } else {
            0.0
        };

        info!(
            frames = state.frame_count,
            fps,
            avg_latency_ms = mean(&state.processing_ms),
            min_latency_ms = fold_min(&state.processing_ms),
            max_latency_ms = fold_max(&state.processing_ms),
            dropped = state.dropped_frames,
            cpu_percent = cpu_percent as f64,
            memory_percent,
            "performance window"
        );
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        // A panic while holding the lock leaves the window usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn mean(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn fold_min(values: &VecDeque<f64>) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn fold_max(values: &VecDeque<f64>) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_zero() {
        let window = MetricsWindow::new(30, 30);
        let snap = window.snapshot();
        assert_eq!(snap.fps, 0.0);
        assert_eq!(snap.avg_latency_ms, 0.0);
        assert_eq!(snap.min_latency_ms, 0.0);
        assert_eq!(snap.max_latency_ms, 0.0);
        assert_eq!(snap.dropped_frames, 0);
    }

    #[test]
    fn test_known_samples() {
        let window = MetricsWindow::new(30, 1000);
        window.record_sample(10.0, 100.0, true);
        window.record_sample(20.0, 100.0, true);
        window.record_sample(30.0, 100.0, true);

        let snap = window.snapshot();
        assert_eq!(snap.avg_latency_ms, 20.0);
        assert_eq!(snap.min_latency_ms, 10.0);
        assert_eq!(snap.max_latency_ms, 30.0);
        assert!((snap.fps - 10.0).abs() < 1e-9);
        assert_eq!(snap.dropped_frames, 0);
    }

    #[test]
    fn test_failed_samples_only_count_as_dropped() {
        let window = MetricsWindow::new(30, 1000);
        window.record_sample(50.0, 100.0, false);
        window.record_sample(50.0, 100.0, false);

        let snap = window.snapshot();
        assert_eq!(snap.dropped_frames, 2);
        assert_eq!(snap.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let window = MetricsWindow::new(2, 1000);
        window.record_sample(10.0, 100.0, true);
        window.record_sample(20.0, 100.0, true);
        window.record_sample(30.0, 100.0, true);

        // The 10 ms sample has been evicted
        let snap = window.snapshot();
        assert_eq!(snap.min_latency_ms, 20.0);
        assert_eq!(snap.max_latency_ms, 30.0);
        assert_eq!(snap.avg_latency_ms, 25.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let window = MetricsWindow::new(30, 1000);
        window.record_sample(10.0, 100.0, true);
        window.record_sample(10.0, 100.0, false);
        window.reset();

        let snap = window.snapshot();
        assert_eq!(snap.dropped_frames, 0);
        assert_eq!(snap.avg_latency_ms, 0.0);
        assert_eq!(snap.fps, 0.0);
    }

    #[test]
    fn test_record_end_measures_something() {
        let window = MetricsWindow::new(30, 1000);
        let timer = window.record_start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        window.record_end(timer, true);

        let snap = window.snapshot();
        assert!(snap.avg_latency_ms >= 5.0);
        assert_eq!(snap.dropped_frames, 0);
    }

    #[test]
    fn test_dropped_survives_window_eviction() {
        let window = MetricsWindow::new(2, 1000);
        for _ in 0..10 {
            window.record_sample(1.0, 10.0, false);
        }
        for _ in 0..10 {
            window.record_sample(1.0, 10.0, true);
        }
        assert_eq!(window.snapshot().dropped_frames, 10);
    }
}
