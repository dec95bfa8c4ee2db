//! Control loop activity: operator buttons and the gap axis.
//!
//! Each poll checks, in order, the "lower" button, the "raise" button and the
//! analog axis. The checks do not short-circuit, so a button shift and a gap
//! change can both land in one poll. After every action the task suspends for
//! a debounce interval instead of spinning.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ControlConfig;
use crate::hal::{AnalogControl, DigitalControl};
use crate::state::{Activity, SharedState};
use crate::thresholds::ThresholdBand;

use super::schedule::{PeriodicTimer, ShutdownSignal, Tick};

/// Operator action applied to the threshold band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAction {
    /// Shift both thresholds down one step
    Lower,
    /// Shift both thresholds up one step
    Raise,
    /// Grow the gap one step
    Widen,
    /// Shrink the gap one step
    Narrow,
}

impl ControlAction {
    pub fn apply(self, band: &mut ThresholdBand) {
        match self {
            ControlAction::Lower => band.lower(),
            ControlAction::Raise => band.raise(),
            ControlAction::Widen => band.widen(),
            ControlAction::Narrow => band.narrow(),
        }
    }
}

/// Map an axis reading to a gap action
///
/// Readings within `deadzone` of `center` (inclusive) are ignored; above
/// center widens, below center narrows.
pub fn axis_action(code: u16, center: i32, deadzone: i32) -> Option<ControlAction> {
    let deflection = code as i32 - center;
    if deflection.abs() <= deadzone {
        None
    } else if deflection > 0 {
        Some(ControlAction::Widen)
    } else {
        Some(ControlAction::Narrow)
    }
}

pub struct ControlLoop {
    lower: Box<dyn DigitalControl>,
    raise: Box<dyn DigitalControl>,
    axis: Box<dyn AnalogControl>,
    config: ControlConfig,
    state: Arc<SharedState>,
}

impl ControlLoop {
    pub fn new(
        config: &ControlConfig,
        lower: Box<dyn DigitalControl>,
        raise: Box<dyn DigitalControl>,
        axis: Box<dyn AnalogControl>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            lower,
            raise,
            axis,
            config: config.clone(),
            state,
        }
    }

    /// Poll all controls once, applying and debouncing each action
    pub async fn poll_once(&mut self) -> Vec<ControlAction> {
        let mut actions = Vec::new();

        if self.lower.is_asserted() {
            self.apply(ControlAction::Lower);
            actions.push(ControlAction::Lower);
            tokio::time::sleep(self.config.shift_debounce()).await;
        }

        if self.raise.is_asserted() {
            self.apply(ControlAction::Raise);
            actions.push(ControlAction::Raise);
            tokio::time::sleep(self.config.shift_debounce()).await;
        }

        let code = self.axis.read_code();
        if let Some(action) = axis_action(code, self.config.axis_center, self.config.axis_deadzone)
        {
            self.apply(action);
            actions.push(action);
            tokio::time::sleep(self.config.gap_debounce()).await;
        }

        actions
    }

    fn apply(&self, action: ControlAction) {
        let band = self.state.update_band(|band| action.apply(band));
        self.state.stats().record_control_action();
        tracing::debug!(
            ?action,
            warning = band.warning(),
            danger = band.danger(),
            gap = band.gap(),
            "[ControlLoop] Thresholds adjusted"
        );
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            "[ControlLoop] Starting: poll every {} ms",
            self.config.poll_period_ms
        );
        let mut timer = PeriodicTimer::new(self.config.poll_period());

        while !shutdown.is_triggered() {
            let actions = self.poll_once().await;

            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                tick = timer.tick() => {
                    // A debounce longer than the period always overruns; only
                    // an idle poll that overruns is worth a warning.
                    if let Tick::Overrun { lateness } = tick {
                        self.state.stats().record_overrun(Activity::Control);
                        if actions.is_empty() {
                            tracing::warn!("[ControlLoop] Poll overran period by {:?}", lateness);
                        }
                    }
                }
            }
        }

        tracing::info!("[ControlLoop] Stopped");
    }
}
