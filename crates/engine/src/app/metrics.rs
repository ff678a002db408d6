use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_poisoned_once(operation: &'static str) {
    if !METRICS_LOCK_POISON_WARNED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_poisoned");
    }
}

/// Loop health over the last metrics interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    /// Frames per second that actually ran a lighting or visibility pass.
    pub recomputes_per_second: f32,
    /// Mean cost of those passes.
    pub recompute_time_ms: f32,
}

/// Shared, lock-recovering view of the latest snapshot. A panic while the
/// lock was held never takes the reader down with it.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.read().unwrap_or_else(|poisoned| {
            warn_poisoned_once("read");
            poisoned.into_inner()
        })
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = self.latest.write().unwrap_or_else(|poisoned| {
            warn_poisoned_once("write");
            poisoned.into_inner()
        });
        *guard = snapshot;
    }
}

/// Event count plus the time those events took.
#[derive(Debug, Clone, Copy, Default)]
struct TimedCounter {
    count: u32,
    total: Duration,
}

impl TimedCounter {
    fn record(&mut self, elapsed: Duration) {
        self.count = self.count.saturating_add(1);
        self.total = self.total.saturating_add(elapsed);
    }

    fn per_second(&self, window_seconds: f32) -> f32 {
        self.count as f32 / window_seconds
    }

    fn mean_ms(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.total.as_secs_f32() * 1000.0 / self.count as f32
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: TimedCounter,
    ticks: u32,
    recomputes: TimedCounter,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: TimedCounter::default(),
            ticks: 0,
            recomputes: TimedCounter::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames.record(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn record_recompute(&mut self, elapsed: Duration) {
        self.recomputes.record(elapsed);
    }

    /// Emits and resets once per interval; `None` until the interval has passed.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let window = now.saturating_duration_since(self.interval_start);
        if window < self.interval {
            return None;
        }
        let window_seconds = window.as_secs_f32().max(f32::EPSILON);
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames.per_second(window_seconds),
            tps: self.ticks as f32 / window_seconds,
            frame_time_ms: self.frames.mean_ms(),
            recomputes_per_second: self.recomputes.per_second(window_seconds),
            recompute_time_ms: self.recomputes.mean_ms(),
        };
        *self = Self {
            interval_start: now,
            ..Self::new(self.interval)
        };
        Some(snapshot)
    }
}
