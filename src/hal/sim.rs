//! Simulated peripherals for tests and the host simulation.
//!
//! Every part keeps its observable state behind an `Arc` so a test can hand
//! the part to the monitor as a trait object and still drive or inspect it.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;

use super::{
    AdcInput, AnalogControl, CaptureFuture, DigitalControl, IndicatorOutput, IndicatorPattern,
    RenderTarget, SampleSource,
};
use crate::error::{CaptureError, DisplayError};

/// Code generator driving a [`SyntheticAdc`]
pub type CodeGenerator = Box<dyn FnMut() -> u16 + Send>;

/// Counters exposed by a [`SyntheticAdc`]
#[derive(Debug, Default)]
pub struct AdcProbe {
    last_input: AtomicU8,
    drains: AtomicU64,
    bulk_captures: AtomicU64,
    polled_reads: AtomicU64,
    stops: AtomicU64,
}

impl AdcProbe {
    pub fn last_input(&self) -> AdcInput {
        AdcInput(self.last_input.load(Ordering::Relaxed))
    }

    pub fn drains(&self) -> u64 {
        self.drains.load(Ordering::Relaxed)
    }

    pub fn bulk_captures(&self) -> u64 {
        self.bulk_captures.load(Ordering::Relaxed)
    }

    pub fn polled_reads(&self) -> u64 {
        self.polled_reads.load(Ordering::Relaxed)
    }

    pub fn stops(&self) -> u64 {
        self.stops.load(Ordering::Relaxed)
    }
}

/// Converter driven by a code generator closure
///
/// Built either with a bulk path that takes `transfer_time` to complete or
/// as a polling-only source.
pub struct SyntheticAdc {
    generator: CodeGenerator,
    transfer_time: Option<Duration>,
    probe: Arc<AdcProbe>,
}

impl SyntheticAdc {
    /// Source with a bulk transfer path
    pub fn dma<F>(generator: F, transfer_time: Duration) -> Self
    where
        F: FnMut() -> u16 + Send + 'static,
    {
        Self {
            generator: Box::new(generator),
            transfer_time: Some(transfer_time),
            probe: Arc::new(AdcProbe::default()),
        }
    }

    /// Source without a bulk transfer path
    pub fn polling<F>(generator: F) -> Self
    where
        F: FnMut() -> u16 + Send + 'static,
    {
        Self {
            generator: Box::new(generator),
            transfer_time: None,
            probe: Arc::new(AdcProbe::default()),
        }
    }

    /// Source that always produces `code`
    pub fn constant(code: u16) -> Self {
        Self::dma(move || code, Duration::ZERO)
    }

    pub fn probe(&self) -> Arc<AdcProbe> {
        Arc::clone(&self.probe)
    }
}

impl SampleSource for SyntheticAdc {
    fn select_input(&mut self, input: AdcInput) {
        self.probe.last_input.store(input.0, Ordering::Relaxed);
    }

    fn drain_fifo(&mut self) {
        self.probe.drains.fetch_add(1, Ordering::Relaxed);
    }

    fn read_code(&mut self) -> u16 {
        self.probe.polled_reads.fetch_add(1, Ordering::Relaxed);
        (self.generator)()
    }

    fn bulk_capture<'a>(&'a mut self, buf: &'a mut [u16]) -> CaptureFuture<'a> {
        let Some(transfer_time) = self.transfer_time else {
            return futures::future::ready(Err(CaptureError::BulkTransferUnavailable)).boxed();
        };

        async move {
            for slot in buf.iter_mut() {
                *slot = (self.generator)();
            }
            if !transfer_time.is_zero() {
                tokio::time::sleep(transfer_time).await;
            }
            self.probe.bulk_captures.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        .boxed()
    }

    fn stop(&mut self) {
        self.probe.stops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Push button whose state is set from outside
#[derive(Debug, Clone, Default)]
pub struct SimButton {
    pressed: Arc<AtomicBool>,
}

impl SimButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self) {
        self.pressed.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.pressed.store(false, Ordering::SeqCst);
    }
}

impl DigitalControl for SimButton {
    fn is_asserted(&mut self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }
}

/// Analog axis whose position is set from outside
#[derive(Debug, Clone)]
pub struct SimAxis {
    code: Arc<AtomicU16>,
    center: u16,
}

impl SimAxis {
    pub fn centered(center: u16) -> Self {
        Self {
            code: Arc::new(AtomicU16::new(center)),
            center,
        }
    }

    pub fn set(&self, code: u16) {
        self.code.store(code, Ordering::SeqCst);
    }

    pub fn recenter(&self) {
        self.set(self.center);
    }
}

impl AnalogControl for SimAxis {
    fn read_code(&mut self) -> u16 {
        self.code.load(Ordering::SeqCst)
    }
}

const NO_PATTERN: u8 = u8::MAX;

/// Indicator that remembers the last pattern written
#[derive(Debug, Clone)]
pub struct RecordingIndicator {
    last: Arc<AtomicU8>,
    writes: Arc<AtomicU64>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self {
            last: Arc::new(AtomicU8::new(NO_PATTERN)),
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn last(&self) -> Option<IndicatorPattern> {
        match self.last.load(Ordering::SeqCst) {
            NO_PATTERN => None,
            bits => Some(IndicatorPattern::from_bits(bits)),
        }
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for RecordingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorOutput for RecordingIndicator {
    fn set_pattern(&mut self, pattern: IndicatorPattern) {
        self.last.store(pattern.to_bits(), Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Glyph cell size of the character surface, in pixels
pub const CELL_SIZE: u32 = 8;

/// Character-cell render surface the size of a 128x64 panel
///
/// Text is laid out on an 8x8 pixel grid. `flush` copies the working cells
/// into the published frame, so observers only ever see whole frames.
#[derive(Debug, Clone)]
pub struct TextSurface {
    columns: usize,
    rows: usize,
    cells: Vec<Vec<char>>,
    published: Option<Vec<String>>,
    flushes: u64,
    fail_flush: bool,
}

impl TextSurface {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        let columns = (width_px / CELL_SIZE) as usize;
        let rows = (height_px / CELL_SIZE) as usize;
        Self {
            columns,
            rows,
            cells: vec![vec![' '; columns]; rows],
            published: None,
            flushes: 0,
            fail_flush: false,
        }
    }

    /// Make every subsequent flush fail (device unplugged)
    pub fn set_fail_flush(&mut self, fail: bool) {
        self.fail_flush = fail;
    }

    /// Last frame pushed to the device, one trimmed string per row
    pub fn published(&self) -> Option<&[String]> {
        self.published.as_deref()
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Working row as currently drawn (not necessarily flushed)
    pub fn row(&self, row: usize) -> Option<String> {
        self.cells
            .get(row)
            .map(|cells| cells.iter().collect::<String>().trim_end().to_string())
    }
}

impl Default for TextSurface {
    fn default() -> Self {
        Self::new(128, 64)
    }
}

impl RenderTarget for TextSurface {
    fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(' ');
        }
    }

    fn draw_text(&mut self, x: u32, y: u32, text: &str) {
        let row = (y / CELL_SIZE) as usize;
        let Some(cells) = self.cells.get_mut(row) else {
            return;
        };
        let start = (x / CELL_SIZE) as usize;
        for (col, ch) in (start..self.columns).zip(text.chars()) {
            cells[col] = ch;
        }
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        if self.fail_flush {
            return Err(DisplayError::FlushFailed {
                reason: "simulated bus error".to_string(),
            });
        }
        let frame = (0..self.rows).filter_map(|row| self.row(row)).collect();
        self.published = Some(frame);
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_surface_clips_and_publishes_on_flush() {
        let mut surface = TextSurface::default();
        surface.draw_text(0, 16, "Level: 1234");
        surface.draw_text(96, 0, "overflowing");

        assert!(surface.published().is_none(), "nothing published before flush");
        surface.flush().unwrap();

        let frame = surface.published().unwrap();
        assert_eq!(frame.len(), 8);
        assert_eq!(frame[0], format!("{:12}over", ""));
        assert_eq!(frame[2], "Level: 1234");
    }

    #[test]
    fn test_text_surface_ignores_rows_past_bottom() {
        let mut surface = TextSurface::default();
        surface.draw_text(0, 64, "hidden");
        surface.flush().unwrap();
        assert!(surface.published().unwrap().iter().all(|row| row.is_empty()));
    }

    #[test]
    fn test_failing_flush_keeps_previous_frame() {
        let mut surface = TextSurface::default();
        surface.draw_text(0, 0, "first");
        surface.flush().unwrap();

        surface.set_fail_flush(true);
        surface.clear();
        surface.draw_text(0, 0, "second");
        assert!(surface.flush().is_err());
        assert_eq!(surface.published().unwrap()[0], "first");
        assert_eq!(surface.flushes(), 1);
    }

    #[test]
    fn test_recording_indicator_tracks_last_pattern() {
        let mut indicator = RecordingIndicator::new();
        let observer = indicator.clone();
        assert!(observer.last().is_none());

        indicator.set_pattern(IndicatorPattern::new(true, false, false));
        assert_eq!(observer.last(), Some(IndicatorPattern::new(true, false, false)));
        assert_eq!(observer.writes(), 1);
    }

    #[tokio::test]
    async fn test_polling_adc_has_no_bulk_path() {
        let mut adc = SyntheticAdc::polling(|| 10);
        let mut buf = [0u16; 3];
        assert!(adc.bulk_capture(&mut buf).await.is_err());
        assert_eq!(adc.read_code(), 10);
        assert_eq!(adc.probe().polled_reads(), 1);
    }
}
