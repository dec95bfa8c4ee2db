//! Engine module housing the periodic activities.
//!
//! `schedule` provides the absolute-deadline timer and cancellation signal,
//! the three activity modules hold one task each, and `core` wires them to
//! the shared state.

pub mod control;
pub mod core;
pub mod presenter;
pub mod sampler;
pub mod schedule;

pub use control::{axis_action, ControlAction, ControlLoop};
pub use core::{MonitorHandle, NoiseMonitor, Peripherals};
pub use presenter::{compose_fields, Presenter, RenderLock, RenderOutcome, TextField};
pub use sampler::{CaptureMode, SampleReport, Sampler};
pub use schedule::{PeriodicTimer, Shutdown, ShutdownSignal, Tick};
