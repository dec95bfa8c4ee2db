// Noise Guard Core - environmental noise threshold monitor
// Periodic sampling, tri-state alerting and operator-tuned thresholds

// Module declarations
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod hal;
pub mod state;
pub mod thresholds;

// Re-exports for convenience
pub use analysis::AlertState;
pub use config::MonitorConfig;
pub use engine::{MonitorHandle, NoiseMonitor, Peripherals};
pub use state::{MonitorSnapshot, SharedState};
pub use thresholds::ThresholdBand;
