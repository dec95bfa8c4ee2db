//! Presenter activity: paints the shared render surface.
//!
//! The surface is shared behind an async mutex. Each cycle waits a bounded
//! time for it; if the wait times out the cycle is skipped and nothing is
//! flushed. Clear, draw and flush all happen under one guard, so the device
//! never receives a half-drawn frame.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::DisplayConfig;
use crate::error::{log_display_error, DisplayError};
use crate::hal::RenderTarget;
use crate::state::{Activity, MonitorSnapshot, SharedState};

use super::schedule::{PeriodicTimer, ShutdownSignal, Tick};

/// Shared, lock-protected render surface
pub type RenderLock<R> = Arc<Mutex<R>>;

/// Vertical distance between text rows, in pixels
pub const LINE_PITCH: u32 = 16;

/// One positioned text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub x: u32,
    pub y: u32,
    pub text: String,
}

/// Result of one presenter cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// The lock was not acquired within the bounded wait
    Skipped,
    FlushFailed,
}

/// Lay out the four fixed fields: title, level, warning, danger
pub fn compose_fields(title: &str, snapshot: &MonitorSnapshot) -> [TextField; 4] {
    let field = |row: u32, text: String| TextField {
        x: 0,
        y: row * LINE_PITCH,
        text,
    };
    [
        field(0, title.to_string()),
        field(1, format!("Level: {}", snapshot.noise_level)),
        field(2, format!("Warn: {}", snapshot.warning)),
        field(3, format!("Dang: {}", snapshot.danger)),
    ]
}

pub struct Presenter<R> {
    surface: RenderLock<R>,
    state: Arc<SharedState>,
    config: DisplayConfig,
}

impl<R: RenderTarget> Presenter<R> {
    pub fn new(config: &DisplayConfig, surface: RenderLock<R>, state: Arc<SharedState>) -> Self {
        Self {
            surface,
            state,
            config: config.clone(),
        }
    }

    /// Try to render one frame within the lock timeout
    pub async fn render_once(&self) -> RenderOutcome {
        let timeout = self.config.lock_timeout();
        let mut surface = match tokio::time::timeout(timeout, self.surface.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                self.state.stats().record_skipped_render();
                let err = DisplayError::LockTimeout {
                    waited_ms: self.config.lock_timeout_ms,
                };
                log_display_error(&err, "Presenter::render_once");
                return RenderOutcome::Skipped;
            }
        };

        let snapshot = self.state.snapshot();
        surface.clear();
        for field in compose_fields(&self.config.title, &snapshot) {
            surface.draw_text(field.x, field.y, &field.text);
        }

        match surface.flush() {
            Ok(()) => {
                self.state.stats().record_render();
                RenderOutcome::Rendered
            }
            Err(err) => {
                self.state.stats().record_flush_failure();
                log_display_error(&err, "Presenter::render_once");
                RenderOutcome::FlushFailed
            }
        }
    }

    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            "[Presenter] Starting: refresh every {} ms",
            self.config.period_ms
        );
        let mut timer = PeriodicTimer::new(self.config.period());

        while !shutdown.is_triggered() {
            self.render_once().await;

            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                tick = timer.tick() => {
                    if let Tick::Overrun { lateness } = tick {
                        self.state.stats().record_overrun(Activity::Presenter);
                        tracing::warn!("[Presenter] Refresh overran period by {:?}", lateness);
                    }
                }
            }
        }

        tracing::info!("[Presenter] Stopped");
    }
}
