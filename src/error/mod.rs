// Error types for the noise guard monitor
//
// Every failure in this crate is either absorbed by the activity that hit it
// (skip the cycle, degrade to polling) or rejected before the monitor starts.
// The types below carry numeric codes so the simulation harness and log
// scrapers can match on them without parsing messages.

mod capture;
mod config;
mod display;

pub use capture::{log_capture_error, CaptureError};
pub use config::ConfigError;
pub use display::{log_display_error, DisplayError};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
