// Analysis module - signal reduction and alert classification
//
// Pipeline per sampling cycle:
// SampleBuffer → RmsConverter (volts RMS → integer level) → classify → indicator

pub mod classifier;
pub mod rms;

pub use classifier::{classify, update_indicator, AlertState};
pub use rms::{RmsConverter, SampleBuffer};
