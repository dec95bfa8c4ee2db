//! Fixed-period scheduling and cancellation for the monitor activities.
//!
//! Deadlines are computed from a fixed baseline (`baseline + k * period`), so
//! a slow cycle does not push later wakes back. A cycle that finishes after
//! its deadline is recorded as an overrun and the next wake happens at once.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

/// Result of waiting for the next period boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Slept until the deadline
    OnTime,
    /// The deadline had already passed by `lateness`
    Overrun { lateness: Duration },
}

/// Absolute-deadline periodic timer
#[derive(Debug)]
pub struct PeriodicTimer {
    period: Duration,
    last_wake: Instant,
    overruns: u64,
    worst_lateness: Duration,
}

impl PeriodicTimer {
    /// Timer whose baseline is the current instant
    pub fn new(period: Duration) -> Self {
        Self::starting_at(Instant::now(), period)
    }

    pub fn starting_at(baseline: Instant, period: Duration) -> Self {
        Self {
            period,
            last_wake: baseline,
            overruns: 0,
            worst_lateness: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Deadline the next `tick` will wait for
    pub fn next_deadline(&self) -> Instant {
        self.last_wake + self.period
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn worst_lateness(&self) -> Duration {
        self.worst_lateness
    }

    /// Suspend until the next period boundary
    pub async fn tick(&mut self) -> Tick {
        let deadline = self.next_deadline();
        self.last_wake = deadline;

        let now = Instant::now();
        if now > deadline {
            let lateness = now - deadline;
            self.overruns += 1;
            self.worst_lateness = self.worst_lateness.max(lateness);
            return Tick::Overrun { lateness };
        }

        sleep_until(deadline).await;
        Tick::OnTime
    }
}

/// Owner side of the cancellation signal
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Activity side of the cancellation signal
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> (Shutdown, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (Shutdown { tx }, ShutdownSignal { rx })
    }

    /// Ask every activity to stop at its next period boundary
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested (or the owner is gone)
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
