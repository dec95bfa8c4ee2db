//! State shared between the periodic activities.
//!
//! - `noise_level`: single writer (sampler), read by the presenter
//! - threshold band: single writer (control loop), read by sampler and presenter
//! - alert state and counters: written by whichever activity owns them
//!
//! Scalars are atomics. The band is a small `Copy` value behind an `RwLock`
//! so warning, danger and gap are always observed together; readers copy it
//! out and never hold the lock across an await point.

use std::sync::atomic::{AtomicI32, AtomicU64, AtomicU8, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::analysis::AlertState;
use crate::thresholds::ThresholdBand;

/// Monotonic counters describing how the activities are coping
#[derive(Debug, Default)]
pub struct MonitorStats {
    windows_sampled: AtomicU64,
    degraded_captures: AtomicU64,
    renders: AtomicU64,
    skipped_renders: AtomicU64,
    flush_failures: AtomicU64,
    control_actions: AtomicU64,
    sampler_overruns: AtomicU64,
    control_overruns: AtomicU64,
    presenter_overruns: AtomicU64,
}

/// Which activity an overrun belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Sampler,
    Control,
    Presenter,
}

impl MonitorStats {
    pub fn record_window(&self, degraded: bool) {
        self.windows_sampled.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.degraded_captures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_render(&self) {
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_render(&self) {
        self.skipped_renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_control_action(&self) {
        self.control_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overrun(&self, activity: Activity) {
        let counter = match activity {
            Activity::Sampler => &self.sampler_overruns,
            Activity::Control => &self.control_overruns,
            Activity::Presenter => &self.presenter_overruns,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            windows_sampled: self.windows_sampled.load(Ordering::Relaxed),
            degraded_captures: self.degraded_captures.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            skipped_renders: self.skipped_renders.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            control_actions: self.control_actions.load(Ordering::Relaxed),
            sampler_overruns: self.sampler_overruns.load(Ordering::Relaxed),
            control_overruns: self.control_overruns.load(Ordering::Relaxed),
            presenter_overruns: self.presenter_overruns.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub windows_sampled: u64,
    pub degraded_captures: u64,
    pub renders: u64,
    pub skipped_renders: u64,
    pub flush_failures: u64,
    pub control_actions: u64,
    pub sampler_overruns: u64,
    pub control_overruns: u64,
    pub presenter_overruns: u64,
}

/// Point-in-time view of the monitor for logging and the simulation CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub noise_level: i32,
    pub warning: i32,
    pub danger: i32,
    pub gap: i32,
    pub alert: AlertState,
    pub stats: StatsSnapshot,
}

/// Shared mutable state of the monitor
#[derive(Debug)]
pub struct SharedState {
    noise_level: AtomicI32,
    band: RwLock<ThresholdBand>,
    alert: AtomicU8,
    stats: MonitorStats,
}

impl SharedState {
    pub fn new(band: ThresholdBand) -> Self {
        Self {
            noise_level: AtomicI32::new(0),
            band: RwLock::new(band),
            alert: AtomicU8::new(AlertState::Normal.to_u8()),
            stats: MonitorStats::default(),
        }
    }

    pub fn noise_level(&self) -> i32 {
        self.noise_level.load(Ordering::Acquire)
    }

    pub fn store_noise_level(&self, level: i32) {
        self.noise_level.store(level, Ordering::Release);
    }

    pub fn alert(&self) -> AlertState {
        AlertState::from_u8(self.alert.load(Ordering::Acquire))
    }

    pub fn store_alert(&self, state: AlertState) {
        self.alert.store(state.to_u8(), Ordering::Release);
    }

    /// Copy of the current band
    pub fn band(&self) -> ThresholdBand {
        *self.read_band()
    }

    /// Apply `update` to the band under the write lock and return the result
    ///
    /// Every band mutation keeps `warning < danger`, so the pair readers see
    /// is valid before and after the call.
    pub fn update_band<F>(&self, update: F) -> ThresholdBand
    where
        F: FnOnce(&mut ThresholdBand),
    {
        let mut guard = self.write_band();
        update(&mut guard);
        *guard
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let band = self.band();
        MonitorSnapshot {
            noise_level: self.noise_level(),
            warning: band.warning(),
            danger: band.danger(),
            gap: band.gap(),
            alert: self.alert(),
            stats: self.stats.snapshot(),
        }
    }

    // A poisoned lock still holds a valid band (ThresholdBand is Copy and
    // every mutation is a single field store), so recover the guard.
    fn read_band(&self) -> RwLockReadGuard<'_, ThresholdBand> {
        self.band.read().unwrap_or_else(|poisoned| {
            tracing::warn!("[SharedState] Threshold band lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_band(&self) -> RwLockWriteGuard<'_, ThresholdBand> {
        self.band.write().unwrap_or_else(|poisoned| {
            tracing::warn!("[SharedState] Threshold band lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(ThresholdBand::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_snapshot() {
        let state = SharedState::default();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.noise_level, 0);
        assert_eq!((snapshot.warning, snapshot.danger, snapshot.gap), (2000, 3000, 1000));
        assert_eq!(snapshot.alert, AlertState::Normal);
        assert_eq!(snapshot.stats, StatsSnapshot::default());
    }

    #[test]
    fn test_update_band_returns_new_value() {
        let state = SharedState::default();
        let band = state.update_band(ThresholdBand::raise);
        assert_eq!(band.warning(), 2100);
        assert_eq!(state.band(), band);
    }

    #[test]
    fn test_concurrent_readers_never_see_inverted_pair() {
        let state = Arc::new(SharedState::default());

        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for i in 0..5_000 {
                    match i % 4 {
                        0 => state.update_band(ThresholdBand::lower),
                        1 => state.update_band(ThresholdBand::narrow),
                        2 => state.update_band(ThresholdBand::raise),
                        _ => state.update_band(ThresholdBand::widen),
                    };
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for _ in 0..5_000 {
                        let snapshot = state.snapshot();
                        assert!(snapshot.warning < snapshot.danger);
                        assert_eq!(snapshot.danger, snapshot.warning + snapshot.gap);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_poisoned_band_lock_is_recovered() {
        let state = Arc::new(SharedState::default());
        let poisoner = Arc::clone(&state);
        let _ = thread::spawn(move || {
            poisoner.update_band(|_| panic!("poison the band lock"));
        })
        .join();

        assert_eq!(state.band().warning(), 2000);
        assert_eq!(state.update_band(ThresholdBand::raise).warning(), 2100);
    }

    #[test]
    fn test_overruns_are_counted_per_activity() {
        let stats = MonitorStats::default();
        stats.record_overrun(Activity::Sampler);
        stats.record_overrun(Activity::Presenter);
        stats.record_overrun(Activity::Presenter);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sampler_overruns, 1);
        assert_eq!(snapshot.control_overruns, 0);
        assert_eq!(snapshot.presenter_overruns, 2);
    }
}
