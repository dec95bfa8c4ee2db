//! Warning/danger threshold band
//!
//! The band stores the warning threshold and the gap; the danger threshold
//! is always derived as `warning + gap`. Because the gap is clamped to
//! `[min_gap, max_gap]` with `min_gap > 0`, `warning < danger` holds for
//! every value this type can represent. No mutation can produce an
//! inverted pair, so there is nothing to detect after the fact.

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;

/// Step sizes and bounds applied by every band mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandLimits {
    pub min_gap: i32,
    pub max_gap: i32,
    pub step: i32,
    pub gap_step: i32,
    /// Lowest warning threshold reachable through [`ThresholdBand::lower`]
    pub floor: i32,
}

impl BandLimits {
    /// Highest warning threshold that still leaves room for the widest gap
    fn ceiling(&self) -> i32 {
        i32::MAX - self.max_gap
    }
}

impl From<&ThresholdConfig> for BandLimits {
    fn from(config: &ThresholdConfig) -> Self {
        Self {
            min_gap: config.min_gap.max(1),
            max_gap: config.max_gap.max(config.min_gap.max(1)),
            step: config.step,
            gap_step: config.gap_step,
            floor: config.floor,
        }
    }
}

/// Ordered (warning, danger) pair with a bounded gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdBand {
    warning: i32,
    gap: i32,
    limits: BandLimits,
}

impl ThresholdBand {
    /// Build a band, clamping inputs into the limits
    ///
    /// A floor above the ceiling (rejected by `MonitorConfig::validate`)
    /// resolves to the ceiling rather than panicking.
    pub fn new(warning: i32, gap: i32, limits: BandLimits) -> Self {
        Self {
            warning: warning.max(limits.floor).min(limits.ceiling()),
            gap: gap.clamp(limits.min_gap, limits.max_gap),
            limits,
        }
    }

    pub fn from_config(config: &ThresholdConfig) -> Self {
        Self::new(config.warning, config.default_gap, BandLimits::from(config))
    }

    pub fn warning(&self) -> i32 {
        self.warning
    }

    pub fn danger(&self) -> i32 {
        self.warning + self.gap
    }

    pub fn gap(&self) -> i32 {
        self.gap
    }

    pub fn limits(&self) -> BandLimits {
        self.limits
    }

    /// Shift both thresholds down by one step, saturating at the floor
    pub fn lower(&mut self) {
        self.warning = self
            .warning
            .saturating_sub(self.limits.step)
            .max(self.limits.floor);
    }

    /// Shift both thresholds up by one step
    pub fn raise(&mut self) {
        self.warning = self
            .warning
            .saturating_add(self.limits.step)
            .min(self.limits.ceiling());
    }

    /// Grow the gap by one gap step, clamped to `max_gap`
    pub fn widen(&mut self) {
        self.gap = self
            .gap
            .saturating_add(self.limits.gap_step)
            .min(self.limits.max_gap);
    }

    /// Shrink the gap by one gap step, clamped to `min_gap`
    pub fn narrow(&mut self) {
        self.gap = self
            .gap
            .saturating_sub(self.limits.gap_step)
            .max(self.limits.min_gap);
    }
}

impl Default for ThresholdBand {
    fn default() -> Self {
        Self::from_config(&ThresholdConfig::default())
    }
}
