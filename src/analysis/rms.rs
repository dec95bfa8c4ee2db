// RMS reduction - converts a window of raw converter codes to a noise level
//
// rms = sqrt( (1/N) * Σ (code_i * full_scale_voltage / 2^bits)^2 )
// level = trunc(rms * level_scale)
//
// N is the fixed capacity of the SampleBuffer, which is never zero, so the
// reduction cannot divide by zero or produce NaN.

use crate::config::{SamplingConfig, MAX_ADC_BITS};

/// Fixed-capacity window of raw converter codes
///
/// Allocated once and overwritten in place every sampling cycle.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    codes: Box<[u16]>,
}

impl SampleBuffer {
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample buffer capacity must be greater than 0");
        Self {
            codes: vec![0u16; capacity].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.codes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        &mut self.codes
    }
}

/// Code-to-voltage conversion parameters for the RMS reduction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmsConverter {
    full_scale_voltage: f32,
    code_divisor: f32,
    max_code: u16,
    level_scale: f32,
}

impl RmsConverter {
    /// # Panics
    /// Panics if `adc_bits` is outside `1..=16` (rejected earlier by
    /// [`MonitorConfig::validate`](crate::config::MonitorConfig::validate))
    pub fn new(full_scale_voltage: f32, adc_bits: u32, level_scale: f32) -> Self {
        assert!(
            (1..=MAX_ADC_BITS).contains(&adc_bits),
            "adc_bits must be in 1..={}",
            MAX_ADC_BITS
        );
        Self {
            full_scale_voltage,
            code_divisor: (1u32 << adc_bits) as f32,
            max_code: ((1u32 << adc_bits) - 1) as u16,
            level_scale,
        }
    }

    pub fn from_config(config: &SamplingConfig) -> Self {
        Self::new(
            config.full_scale_voltage,
            config.adc_bits,
            config.level_scale,
        )
    }

    /// Largest code the converter can produce
    pub fn max_code(&self) -> u16 {
        self.max_code
    }

    /// RMS voltage of the window
    ///
    /// Codes above the converter range are clamped to `max_code`, which keeps
    /// the result within `[0, full_scale_voltage]`.
    pub fn rms_volts(&self, buffer: &SampleBuffer) -> f32 {
        let codes = buffer.as_slice();
        let scale = self.full_scale_voltage as f64 / self.code_divisor as f64;
        let sum_squares: f64 = codes
            .iter()
            .map(|&code| {
                let volts = code.min(self.max_code) as f64 * scale;
                volts * volts
            })
            .sum();
        (sum_squares / codes.len() as f64).sqrt() as f32
    }

    /// Scale an RMS voltage to integer display units (truncating)
    pub fn to_level(&self, rms_volts: f32) -> i32 {
        (rms_volts * self.level_scale) as i32
    }

    /// Reduce a window straight to a noise level
    pub fn level(&self, buffer: &SampleBuffer) -> i32 {
        self.to_level(self.rms_volts(buffer))
    }
}

impl Default for RmsConverter {
    fn default() -> Self {
        Self::from_config(&SamplingConfig::default())
    }
}
