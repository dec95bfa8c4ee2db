//! Monitor configuration
//!
//! The firmware runs with the compiled-in defaults below. The JSON loader
//! exists so the host simulation can try other timings and thresholds
//! without recompiling; nothing is persisted back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Number of codes captured per sampling window
pub const SAMPLE_COUNT: usize = 200;
/// Sampler period in milliseconds
pub const SAMPLE_PERIOD_MS: u64 = 100;
/// Presenter period in milliseconds
pub const DISPLAY_PERIOD_MS: u64 = 500;
/// Bounded wait for the render lock in milliseconds
pub const RENDER_LOCK_TIMEOUT_MS: u64 = 100;
/// Control loop poll period in milliseconds
pub const CONTROL_POLL_MS: u64 = 50;
/// Widest converter resolution a `u16` code can carry
pub const MAX_ADC_BITS: u32 = 16;

pub const DEFAULT_WARNING: i32 = 2000;
pub const DEFAULT_DANGER: i32 = 3000;
pub const DEFAULT_GAP: i32 = 1000;
pub const MIN_GAP: i32 = 200;
pub const MAX_GAP: i32 = 2000;
pub const THRESHOLD_STEP: i32 = 100;
pub const GAP_STEP: i32 = 50;
/// Lowest value the warning threshold may be shifted to
pub const THRESHOLD_FLOOR: i32 = 0;

pub const SHIFT_DEBOUNCE_MS: u64 = 200;
pub const GAP_DEBOUNCE_MS: u64 = 100;
pub const AXIS_CENTER: i32 = 2048;
pub const AXIS_DEADZONE: i32 = 500;

/// Complete monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MonitorConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Sampler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Codes per window (N in the RMS reduction)
    pub sample_count: usize,
    pub period_ms: u64,
    /// Reference voltage of the converter
    pub full_scale_voltage: f32,
    /// Converter resolution; codes are divided by 2^bits
    pub adc_bits: u32,
    /// Multiplier from volts RMS to integer display units
    pub level_scale: f32,
}

impl SamplingConfig {
    fn validate_conversion(&self) -> Result<(), ConfigError> {
        let reason = if !(1..=MAX_ADC_BITS).contains(&self.adc_bits) {
            format!("adc_bits must be in 1..={} (got {})", MAX_ADC_BITS, self.adc_bits)
        } else if !(self.full_scale_voltage.is_finite() && self.full_scale_voltage > 0.0) {
            format!(
                "full_scale_voltage must be positive (got {})",
                self.full_scale_voltage
            )
        } else if !(self.level_scale.is_finite() && self.level_scale > 0.0) {
            format!("level_scale must be positive (got {})", self.level_scale)
        } else {
            return Ok(());
        };
        Err(ConfigError::InvalidConversion { reason })
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_count: SAMPLE_COUNT,
            period_ms: SAMPLE_PERIOD_MS,
            full_scale_voltage: 3.3,
            adc_bits: 12,
            level_scale: 1000.0,
        }
    }
}

/// Threshold band defaults and adjustment steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub warning: i32,
    pub danger: i32,
    pub default_gap: i32,
    pub min_gap: i32,
    pub max_gap: i32,
    /// Shift applied to both thresholds per digital control press
    pub step: i32,
    /// Gap change per analog deflection
    pub gap_step: i32,
    pub floor: i32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING,
            danger: DEFAULT_DANGER,
            default_gap: DEFAULT_GAP,
            min_gap: MIN_GAP,
            max_gap: MAX_GAP,
            step: THRESHOLD_STEP,
            gap_step: GAP_STEP,
            floor: THRESHOLD_FLOOR,
        }
    }
}

/// Control loop timing and analog axis geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub poll_period_ms: u64,
    pub shift_debounce_ms: u64,
    pub gap_debounce_ms: u64,
    pub axis_center: i32,
    pub axis_deadzone: i32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: CONTROL_POLL_MS,
            shift_debounce_ms: SHIFT_DEBOUNCE_MS,
            gap_debounce_ms: GAP_DEBOUNCE_MS,
            axis_center: AXIS_CENTER,
            axis_deadzone: AXIS_DEADZONE,
        }
    }
}

/// Presenter timing and layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub period_ms: u64,
    pub lock_timeout_ms: u64,
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            period_ms: DISPLAY_PERIOD_MS,
            lock_timeout_ms: RENDER_LOCK_TIMEOUT_MS,
            title: "Noise Guard".to_string(),
        }
    }
}

impl SamplingConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl ControlConfig {
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    pub fn shift_debounce(&self) -> Duration {
        Duration::from_millis(self.shift_debounce_ms)
    }

    pub fn gap_debounce(&self) -> Duration {
        Duration::from_millis(self.gap_debounce_ms)
    }
}

impl DisplayConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl MonitorConfig {
    /// Load configuration from a JSON file
    ///
    /// A missing or unparsable file is not fatal: the compiled-in defaults
    /// are returned and a warning is logged.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    tracing::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Reject configurations the activities cannot run with
    ///
    /// Covers the band invariant (`warning < danger` for every reachable
    /// band), control direction and the converter parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.sample_count == 0 {
            return Err(ConfigError::ZeroSampleCount);
        }

        self.sampling.validate_conversion()?;

        let t = &self.thresholds;
        if t.min_gap <= 0 || t.min_gap > t.max_gap {
            return Err(ConfigError::InvalidGapBounds {
                min_gap: t.min_gap,
                max_gap: t.max_gap,
            });
        }

        if t.step <= 0 || t.gap_step <= 0 || t.gap_step > t.max_gap {
            return Err(ConfigError::InvalidSteps {
                step: t.step,
                gap_step: t.gap_step,
            });
        }

        // Highest warning threshold that leaves room for the widest gap
        let ceiling = i32::MAX - t.max_gap;
        if t.floor > ceiling {
            return Err(ConfigError::InvalidFloor {
                floor: t.floor,
                ceiling,
            });
        }

        let gap_in_bounds = (t.min_gap..=t.max_gap).contains(&t.default_gap);
        let consistent = t.warning.checked_add(t.default_gap) == Some(t.danger);
        if !gap_in_bounds || !consistent || !(t.floor..=ceiling).contains(&t.warning) {
            return Err(ConfigError::InvalidDefaults {
                warning: t.warning,
                danger: t.danger,
                gap: t.default_gap,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.sampling.sample_count, 200);
        assert_eq!(config.sampling.period_ms, 100);
        assert_eq!(config.display.period_ms, 500);
        assert_eq!(config.control.poll_period_ms, 50);
        assert_eq!(config.thresholds.warning, 2000);
        assert_eq!(config.thresholds.danger, 3000);
        assert_eq!(config.thresholds.default_gap, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults_for_missing_sections() {
        let json = r#"{ "control": { "poll_period_ms": 20, "shift_debounce_ms": 150,
            "gap_debounce_ms": 80, "axis_center": 2048, "axis_deadzone": 300 } }"#;
        let parsed: MonitorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.control.poll_period_ms, 20);
        assert_eq!(parsed.control.axis_deadzone, 300);
        assert_eq!(parsed.sampling, SamplingConfig::default());
        assert_eq!(parsed.thresholds, ThresholdConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = MonitorConfig::load_from_file("/nonexistent/noise_guard.json");
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_validate_rejects_inverted_gap_bounds() {
        let mut config = MonitorConfig::default();
        config.thresholds.min_gap = 2500;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGapBounds { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inconsistent_defaults() {
        let mut config = MonitorConfig::default();
        config.thresholds.danger = 2500;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDefaults { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_floor_above_ceiling() {
        let mut config = MonitorConfig::default();
        config.thresholds.floor = i32::MAX - 1500;
        config.thresholds.warning = i32::MAX - 1500;
        config.thresholds.danger = i32::MAX - 500;

        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidFloor {
                floor: i32::MAX - 1500,
                ceiling: i32::MAX - 2000
            })
        );
    }

    #[test]
    fn test_validate_rejects_warning_above_ceiling() {
        let mut config = MonitorConfig::default();
        config.thresholds.warning = i32::MAX - 1500;
        config.thresholds.danger = i32::MAX - 500;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDefaults { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_steps() {
        for (step, gap_step) in [(-100, 50), (0, 50), (100, -50), (100, 0), (100, i32::MAX)] {
            let mut config = MonitorConfig::default();
            config.thresholds.step = step;
            config.thresholds.gap_step = gap_step;
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidSteps { step, gap_step }),
                "step={} gap_step={}",
                step,
                gap_step
            );
        }
    }

    #[test]
    fn test_validate_accepts_gap_step_spanning_the_whole_range() {
        let mut config = MonitorConfig::default();
        config.thresholds.gap_step = MAX_GAP;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_converter_parameters() {
        let cases: [fn(&mut SamplingConfig); 5] = [
            |s| s.adc_bits = 0,
            |s| s.adc_bits = 17,
            |s| s.full_scale_voltage = -3.3,
            |s| s.full_scale_voltage = f32::NAN,
            |s| s.level_scale = 0.0,
        ];
        for tweak in cases {
            let mut config = MonitorConfig::default();
            tweak(&mut config.sampling);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidConversion { .. })
            ));
        }
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let mut config = MonitorConfig::default();
        config.sampling.sample_count = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSampleCount));
    }
}
