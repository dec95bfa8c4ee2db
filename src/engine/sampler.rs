//! Sampler activity: capture a window, reduce it to a noise level, classify.
//!
//! # Cycle
//! ```text
//! select noise input → drain stale FIFO codes
//!   ├─> bulk_capture (suspends until the transfer completes)
//!   └─> on failure: poll read_code() over the same window
//! RMS → level → SharedState → classify → indicator
//! ```
//!
//! Classification runs inside the sampler cycle, so the level the classifier
//! sees is always the one written a moment earlier in the same cycle.

use std::sync::Arc;

use crate::analysis::{update_indicator, AlertState, RmsConverter, SampleBuffer};
use crate::config::SamplingConfig;
use crate::error::{log_capture_error, CaptureError};
use crate::hal::{AdcInput, IndicatorOutput, SampleSource};
use crate::state::{Activity, SharedState};

use super::schedule::{PeriodicTimer, ShutdownSignal, Tick};

/// How the last window was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Hardware-assisted bulk transfer
    Bulk,
    /// Direct per-sample polling
    Polled,
}

/// Outcome of one sampler cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReport {
    pub level: i32,
    pub alert: AlertState,
    pub mode: CaptureMode,
}

pub struct Sampler {
    source: Box<dyn SampleSource>,
    indicator: Box<dyn IndicatorOutput>,
    buffer: SampleBuffer,
    converter: RmsConverter,
    state: Arc<SharedState>,
    config: SamplingConfig,
    bulk_available: bool,
}

impl Sampler {
    /// # Panics
    /// Panics if `config.sample_count` is 0 (rejected earlier by
    /// [`MonitorConfig::validate`](crate::config::MonitorConfig::validate))
    pub fn new(
        config: &SamplingConfig,
        source: Box<dyn SampleSource>,
        indicator: Box<dyn IndicatorOutput>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            source,
            indicator,
            buffer: SampleBuffer::new(config.sample_count),
            converter: RmsConverter::from_config(config),
            state,
            config: config.clone(),
            bulk_available: true,
        }
    }

    /// Fill the sample buffer with a fresh window
    pub async fn capture(&mut self) -> CaptureMode {
        self.source.select_input(AdcInput::NOISE);
        self.source.drain_fifo();
        let mode = self.fill_window().await;
        self.source.stop();
        mode
    }

    async fn fill_window(&mut self) -> CaptureMode {
        if self.bulk_available {
            match self.source.bulk_capture(self.buffer.as_mut_slice()).await {
                Ok(()) => return CaptureMode::Bulk,
                Err(CaptureError::BulkTransferUnavailable) => {
                    tracing::info!(
                        "[Sampler] Bulk transfer unavailable, polling {} codes per window",
                        self.buffer.len()
                    );
                    self.bulk_available = false;
                }
                Err(err) => log_capture_error(&err, "Sampler::capture"),
            }
        }

        // Overwrites the whole window, including anything a failed transfer left
        for slot in self.buffer.as_mut_slice() {
            *slot = self.source.read_code();
        }
        CaptureMode::Polled
    }

    /// Capture, reduce, publish and classify one window
    pub async fn run_cycle(&mut self) -> SampleReport {
        let mode = self.capture().await;

        let level = self.converter.level(&self.buffer);
        self.state.store_noise_level(level);

        let band = self.state.band();
        let alert = update_indicator(self.indicator.as_mut(), level, &band);
        let previous = self.state.alert();
        self.state.store_alert(alert);
        self.state
            .stats()
            .record_window(mode == CaptureMode::Polled);

        if previous != alert {
            tracing::info!(
                level,
                warning = band.warning(),
                danger = band.danger(),
                "[Sampler] Alert {} -> {}",
                previous.label(),
                alert.label()
            );
        } else {
            tracing::debug!(level, ?mode, "[Sampler] Window reduced");
        }

        SampleReport { level, alert, mode }
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            "[Sampler] Starting: {} codes every {} ms",
            self.config.sample_count,
            self.config.period_ms
        );
        let mut timer = PeriodicTimer::new(self.config.period());

        while !shutdown.is_triggered() {
            self.run_cycle().await;

            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                tick = timer.tick() => {
                    if let Tick::Overrun { lateness } = tick {
                        self.state.stats().record_overrun(Activity::Sampler);
                        tracing::warn!("[Sampler] Cycle overran period by {:?}", lateness);
                    }
                }
            }
        }

        tracing::info!("[Sampler] Stopped");
    }
}
