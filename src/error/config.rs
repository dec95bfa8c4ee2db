// Configuration validation errors

use crate::error::ErrorCode;
use std::fmt;

/// Configuration rejected by [`MonitorConfig::validate`](crate::config::MonitorConfig::validate)
///
/// Error code range: 5001-5006
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Gap bounds cannot keep warning strictly below danger
    InvalidGapBounds { min_gap: i32, max_gap: i32 },

    /// Default thresholds disagree with the default gap or its bounds
    InvalidDefaults {
        warning: i32,
        danger: i32,
        gap: i32,
    },

    /// Reduction over an empty window is undefined
    ZeroSampleCount,

    /// Steps must be positive or the controls act in reverse
    InvalidSteps { step: i32, gap_step: i32 },

    /// Floor leaves no room below the highest representable warning threshold
    InvalidFloor { floor: i32, ceiling: i32 },

    /// Converter parameters cannot produce a level in `[0, full scale]`
    InvalidConversion { reason: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidGapBounds { .. } => 5001,
            ConfigError::InvalidDefaults { .. } => 5002,
            ConfigError::ZeroSampleCount => 5003,
            ConfigError::InvalidSteps { .. } => 5004,
            ConfigError::InvalidFloor { .. } => 5005,
            ConfigError::InvalidConversion { .. } => 5006,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidGapBounds { min_gap, max_gap } => format!(
                "Gap bounds must satisfy 0 < min <= max (got min={}, max={})",
                min_gap, max_gap
            ),
            ConfigError::InvalidDefaults {
                warning,
                danger,
                gap,
            } => format!(
                "Default thresholds must satisfy danger == warning + gap within bounds (warning={}, danger={}, gap={})",
                warning, danger, gap
            ),
            ConfigError::ZeroSampleCount => "Sample count must be greater than 0".to_string(),
            ConfigError::InvalidSteps { step, gap_step } => format!(
                "Steps must satisfy step > 0 and 0 < gap_step <= max_gap (got step={}, gap_step={})",
                step, gap_step
            ),
            ConfigError::InvalidFloor { floor, ceiling } => format!(
                "Threshold floor {} is above the ceiling {}",
                floor, ceiling
            ),
            ConfigError::InvalidConversion { reason } => {
                format!("Invalid converter parameters: {}", reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
