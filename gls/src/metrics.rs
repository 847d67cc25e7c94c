//! Lightweight, lock-free performance counters for the GLS core.
//!
//! Grounded on the teacher crate's `PerfMetrics`/`ScopedTimer` pattern:
//! atomic counters updated with `Ordering::Relaxed`, a point-in-time
//! snapshot type, and a `Drop`-based scoped timer. Never touched on the
//! `Get` hot path — only arming, sweeping, and error paths record here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Process-wide GLS metrics. One instance per process, created lazily on
/// first access via [`global`].
pub struct GlsMetrics {
    pub(crate) records_armed: AtomicU64,
    pub(crate) arm_retries: AtomicU64,
    pub(crate) profiler_rearms: AtomicU64,
    pub(crate) sweeps_completed: AtomicU64,
    pub(crate) sweep_time_ns: AtomicU64,
    pub(crate) callback_panics_swallowed: AtomicU64,
    pub(crate) close_panics_swallowed: AtomicU64,
}

impl GlsMetrics {
    fn new() -> Self {
        Self {
            records_armed: AtomicU64::new(0),
            arm_retries: AtomicU64::new(0),
            profiler_rearms: AtomicU64::new(0),
            sweeps_completed: AtomicU64::new(0),
            sweep_time_ns: AtomicU64::new(0),
            callback_panics_swallowed: AtomicU64::new(0),
            close_panics_swallowed: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_armed(&self) {
        self.records_armed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_arm_retry(&self) {
        self.arm_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_profiler_rearm(&self) {
        self.profiler_rearms.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self, duration: Duration) {
        self.sweeps_completed.fetch_add(1, Ordering::Relaxed);
        self.sweep_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_callback_panic_swallowed(&self) {
        self.callback_panics_swallowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_close_panic_swallowed(&self) {
        self.close_panics_swallowed.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let sweeps = self.sweeps_completed.load(Ordering::Relaxed);
        let sweep_ns = self.sweep_time_ns.load(Ordering::Relaxed);
        MetricsSnapshot {
            records_armed: self.records_armed.load(Ordering::Relaxed),
            arm_retries: self.arm_retries.load(Ordering::Relaxed),
            profiler_rearms: self.profiler_rearms.load(Ordering::Relaxed),
            sweeps_completed: sweeps,
            avg_sweep_us: if sweeps == 0 {
                0.0
            } else {
                (sweep_ns as f64) / (sweeps as f64) / 1_000.0
            },
            callback_panics_swallowed: self.callback_panics_swallowed.load(Ordering::Relaxed),
            close_panics_swallowed: self.close_panics_swallowed.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<GlsMetrics> = OnceLock::new();

/// Access the process-wide metrics instance.
pub fn global() -> &'static GlsMetrics {
    METRICS.get_or_init(GlsMetrics::new)
}

/// A point-in-time snapshot of [`GlsMetrics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub records_armed: u64,
    pub arm_retries: u64,
    pub profiler_rearms: u64,
    pub sweeps_completed: u64,
    pub avg_sweep_us: f64,
    pub callback_panics_swallowed: u64,
    pub close_panics_swallowed: u64,
}

impl MetricsSnapshot {
    /// Human-readable report, in the spirit of the teacher's
    /// `PerfSnapshot::print_report`.
    pub fn print_report(&self) {
        println!("gls metrics:");
        println!(
            "  armed={} (retries={}, profiler rearms={})",
            self.records_armed, self.arm_retries, self.profiler_rearms
        );
        println!(
            "  sweeps={} (avg {:.3} us)",
            self.sweeps_completed, self.avg_sweep_us
        );
        println!(
            "  swallowed panics: callbacks={}, closes={}",
            self.callback_panics_swallowed, self.close_panics_swallowed
        );
    }
}

/// A scoped timer that records a sweep's duration on drop. Grounded on
/// the teacher's `ScopedTimer<'a>` pattern.
pub(crate) struct SweepTimer {
    start: Instant,
}

impl SweepTimer {
    pub(crate) fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for SweepTimer {
    fn drop(&mut self) {
        global().record_sweep(self.start.elapsed());
    }
}
