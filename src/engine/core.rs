//! NoiseMonitor: wires the sampler, control loop and presenter together.
//!
//! The activities share one `Arc<SharedState>` and one render lock, and each
//! runs as its own tokio task on a fixed period. `MonitorHandle::shutdown`
//! asks all three to stop at their next period boundary and waits for them.
//!
//! Tokio has no task priorities. The sampler keeps its deadline by never
//! touching the render lock and holding the band lock only long enough to
//! copy it out; see `DESIGN.md` for the scheduling notes.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::MonitorConfig;
use crate::error::ConfigError;
use crate::hal::{AnalogControl, DigitalControl, IndicatorOutput, RenderTarget, SampleSource};
use crate::state::{MonitorSnapshot, SharedState};
use crate::thresholds::ThresholdBand;

use super::control::ControlLoop;
use super::presenter::{Presenter, RenderLock};
use super::sampler::Sampler;
use super::schedule::Shutdown;

/// Peripherals handed to the monitor at start-up
pub struct Peripherals<R> {
    pub sample_source: Box<dyn SampleSource>,
    pub indicator: Box<dyn IndicatorOutput>,
    pub lower_button: Box<dyn DigitalControl>,
    pub raise_button: Box<dyn DigitalControl>,
    pub control_axis: Box<dyn AnalogControl>,
    pub render_target: R,
}

/// Entry point for starting the monitor activities
pub struct NoiseMonitor;

impl NoiseMonitor {
    /// Validate `config` and spawn all activities on the current runtime
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime
    pub fn spawn<R: RenderTarget>(
        config: MonitorConfig,
        peripherals: Peripherals<R>,
    ) -> Result<MonitorHandle<R>, ConfigError> {
        config.validate()?;

        let state = Arc::new(SharedState::new(ThresholdBand::from_config(
            &config.thresholds,
        )));
        let render_lock: RenderLock<R> = Arc::new(Mutex::new(peripherals.render_target));
        let shutdown = Shutdown::new().0;

        let sampler = Sampler::new(
            &config.sampling,
            peripherals.sample_source,
            peripherals.indicator,
            Arc::clone(&state),
        );
        let control = ControlLoop::new(
            &config.control,
            peripherals.lower_button,
            peripherals.raise_button,
            peripherals.control_axis,
            Arc::clone(&state),
        );
        let presenter = Presenter::new(&config.display, Arc::clone(&render_lock), Arc::clone(&state));

        let tasks = vec![
            ("sampler", tokio::spawn(sampler.run(shutdown.signal()))),
            ("control", tokio::spawn(control.run(shutdown.signal()))),
            ("presenter", tokio::spawn(presenter.run(shutdown.signal()))),
        ];

        let band = state.band();
        tracing::info!(
            warning = band.warning(),
            danger = band.danger(),
            gap = band.gap(),
            "[NoiseMonitor] Started"
        );

        Ok(MonitorHandle {
            state,
            render_lock,
            shutdown,
            tasks,
        })
    }
}

/// Handle to a running monitor
pub struct MonitorHandle<R> {
    state: Arc<SharedState>,
    render_lock: RenderLock<R>,
    shutdown: Shutdown,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl<R: RenderTarget> MonitorHandle<R> {
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// The render lock shared with the presenter
    pub fn render_lock(&self) -> RenderLock<R> {
        Arc::clone(&self.render_lock)
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.state.snapshot()
    }

    /// Stop all activities and wait for them to finish
    pub async fn shutdown(self) -> MonitorSnapshot {
        self.shutdown.trigger();
        for (name, task) in self.tasks {
            if let Err(err) = task.await {
                tracing::error!("[NoiseMonitor] {} task ended abnormally: {}", name, err);
            }
        }
        let snapshot = self.state.snapshot();
        tracing::info!(?snapshot, "[NoiseMonitor] Stopped");
        snapshot
    }
}
