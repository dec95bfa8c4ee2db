// Classifier - maps a noise level onto the three alert states
//
// Decision rule, evaluated fresh every cycle:
// 1. IF level < warning THEN Normal
// 2. ELSE IF level < danger THEN Warning
// 3. ELSE Danger
//
// There is no memory between calls: a level sitting on a threshold makes the
// indicator follow it cycle by cycle. Only the operator controls are
// debounced, never the alert output.

use serde::{Deserialize, Serialize};

use crate::hal::{IndicatorOutput, IndicatorPattern};
use crate::thresholds::ThresholdBand;

/// Alert state derived from (level, thresholds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertState {
    /// Below the warning threshold ("ok" colour)
    Normal,
    /// Between warning (inclusive) and danger (exclusive)
    Warning,
    /// At or above the danger threshold
    Danger,
}

impl AlertState {
    /// Classify against an explicit pair; callers guarantee `warning < danger`
    pub fn from_thresholds(level: i32, warning: i32, danger: i32) -> Self {
        if level < warning {
            AlertState::Normal
        } else if level < danger {
            AlertState::Warning
        } else {
            AlertState::Danger
        }
    }

    /// Indicator channels for this state: green, yellow (red+green), red
    pub fn indicator(self) -> IndicatorPattern {
        match self {
            AlertState::Normal => IndicatorPattern::new(false, true, false),
            AlertState::Warning => IndicatorPattern::new(true, true, false),
            AlertState::Danger => IndicatorPattern::new(true, false, false),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertState::Normal => "normal",
            AlertState::Warning => "warning",
            AlertState::Danger => "danger",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            AlertState::Normal => 0,
            AlertState::Warning => 1,
            AlertState::Danger => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => AlertState::Normal,
            1 => AlertState::Warning,
            _ => AlertState::Danger,
        }
    }
}

/// Classify a level against the current band
pub fn classify(level: i32, band: &ThresholdBand) -> AlertState {
    AlertState::from_thresholds(level, band.warning(), band.danger())
}

/// Classify and drive the indicator in one step
pub fn update_indicator(
    indicator: &mut dyn IndicatorOutput,
    level: i32,
    band: &ThresholdBand,
) -> AlertState {
    let state = classify(level, band);
    indicator.set_pattern(state.indicator());
    state
}
