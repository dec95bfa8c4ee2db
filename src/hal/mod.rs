//! Hardware seams for the monitor core.
//!
//! Pin bring-up, the display driver and its wire protocol live outside this
//! crate. The core only talks to the traits below, so the same activities run
//! against real peripherals, the FIFO-backed host converter in [`fifo`] or the
//! simulated parts in [`sim`].

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, DisplayError};

pub mod fifo;
pub mod sim;

pub use fifo::{AdcFeeder, FifoAdc};
pub use sim::{AdcProbe, RecordingIndicator, SimAxis, SimButton, SyntheticAdc, TextSurface};

/// Future returned by [`SampleSource::bulk_capture`]
pub type CaptureFuture<'a> = BoxFuture<'a, Result<(), CaptureError>>;

/// Converter input multiplexer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdcInput(pub u8);

impl AdcInput {
    /// Operator control axis (joystick X)
    pub const CONTROL_AXIS: AdcInput = AdcInput(1);
    /// Microphone noise input
    pub const NOISE: AdcInput = AdcInput(2);
}

/// Raw analog sample source.
///
/// Implementations that have a hardware-assisted transfer path override
/// [`bulk_capture`](SampleSource::bulk_capture); the default reports the path
/// as unavailable and the sampler falls back to [`read_code`](SampleSource::read_code).
pub trait SampleSource: Send {
    fn select_input(&mut self, input: AdcInput);

    /// Discard any codes queued from an earlier conversion run
    fn drain_fifo(&mut self);

    /// Read one code from the selected input
    fn read_code(&mut self) -> u16;

    /// Fill `buf` from the selected input, resolving once the transfer completes
    fn bulk_capture<'a>(&'a mut self, buf: &'a mut [u16]) -> CaptureFuture<'a> {
        let _ = buf;
        future::ready(Err(CaptureError::BulkTransferUnavailable)).boxed()
    }

    /// Halt conversions once a window has been captured
    fn stop(&mut self) {}
}

/// On/off state of the three indicator channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndicatorPattern {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl IndicatorPattern {
    pub const fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }

    pub(crate) fn to_bits(self) -> u8 {
        (self.red as u8) | ((self.green as u8) << 1) | ((self.blue as u8) << 2)
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        Self {
            red: bits & 0b001 != 0,
            green: bits & 0b010 != 0,
            blue: bits & 0b100 != 0,
        }
    }
}

/// Tri-state visual/audible alert output
pub trait IndicatorOutput: Send {
    fn set_pattern(&mut self, pattern: IndicatorPattern);
}

/// Off-screen render surface owned by the display adapter
pub trait RenderTarget: Send + 'static {
    fn clear(&mut self);

    /// Draw `text` with its top-left corner at pixel (x, y)
    fn draw_text(&mut self, x: u32, y: u32, text: &str);

    /// Push the composed surface to the device
    fn flush(&mut self) -> Result<(), DisplayError>;
}

/// Momentary push button
pub trait DigitalControl: Send {
    /// `true` while the control is held
    fn is_asserted(&mut self) -> bool;
}

/// Continuous control axis
pub trait AnalogControl: Send {
    fn read_code(&mut self) -> u16;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PollOnly;

    impl SampleSource for PollOnly {
        fn select_input(&mut self, _input: AdcInput) {}
        fn drain_fifo(&mut self) {}
        fn read_code(&mut self) -> u16 {
            7
        }
    }

    #[tokio::test]
    async fn test_default_bulk_capture_is_unavailable() {
        let mut source = PollOnly;
        let mut buf = [0u16; 4];
        let result = source.bulk_capture(&mut buf).await;
        assert_eq!(result, Err(CaptureError::BulkTransferUnavailable));
        assert_eq!(buf, [0; 4], "unavailable path must not touch the buffer");
    }

    #[test]
    fn test_indicator_bits_layout() {
        assert_eq!(IndicatorPattern::new(false, true, false).to_bits(), 0b010);
        assert_eq!(
            IndicatorPattern::from_bits(0b011),
            IndicatorPattern::new(true, true, false)
        );
    }
}
