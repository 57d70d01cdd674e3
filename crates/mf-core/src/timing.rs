//! Lightweight stage timing for the step kernels.
//!
//! Disabled unless `MF_TIMING` is set or [`enable_timing`] was called.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable stage timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable stage timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("MF_TIMING").is_ok()
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Scope guard recording into an [`AccumulatingTimer`] on drop.
pub struct StageGuard<'a> {
    timer: &'a AccumulatingTimer,
    start: Option<Instant>,
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            self.timer.record(start.elapsed().as_secs_f64());
        }
    }
}

/// Start timing a stage; a no-op guard when timing is disabled.
pub fn stage(timer: &AccumulatingTimer) -> StageGuard<'_> {
    StageGuard {
        timer,
        start: is_enabled().then(Instant::now),
    }
}

/// Per-stage timers of one time step.
pub mod step_timing {
    use super::AccumulatingTimer;

    pub static GRADIENTS: AccumulatingTimer = AccumulatingTimer::new();
    pub static CONVECTIVE_FLUXES: AccumulatingTimer = AccumulatingTimer::new();
    pub static DIFFUSIVE_FLUXES: AccumulatingTimer = AccumulatingTimer::new();
    pub static COMMIT: AccumulatingTimer = AccumulatingTimer::new();
    pub static RELAXATIONS: AccumulatingTimer = AccumulatingTimer::new();

    pub fn reset_all() {
        for t in all() {
            t.1.reset();
        }
    }

    pub fn all() -> [(&'static str, &'static AccumulatingTimer); 5] {
        [
            ("gradients", &GRADIENTS),
            ("convective fluxes", &CONVECTIVE_FLUXES),
            ("diffusive fluxes", &DIFFUSIVE_FLUXES),
            ("commit", &COMMIT),
            ("relaxations", &RELAXATIONS),
        ]
    }

    /// One line per stage that recorded anything.
    pub fn summary() -> Vec<String> {
        all()
            .iter()
            .filter(|(_, t)| t.count() > 0)
            .map(|(label, t)| {
                format!(
                    "{label}: {} calls, {:.3}s total",
                    t.count(),
                    t.total_seconds()
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulating_timer_counts() {
        let t = AccumulatingTimer::new();
        t.record(0.5);
        t.record(0.25);
        assert_eq!(t.count(), 2);
        assert!((t.total_seconds() - 0.75).abs() < 1e-6);
        t.reset();
        assert_eq!(t.count(), 0);
    }
}
