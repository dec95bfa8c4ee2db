// Display / render errors

use crate::error::ErrorCode;
use std::fmt;

/// Log a display error with structured context
///
/// Display errors are absorbed by the presenter; the next period retries.
pub fn log_display_error(err: &DisplayError, context: &str) {
    tracing::warn!(
        code = err.code(),
        component = "Presenter",
        "Display error in {}: {}",
        context,
        err.message()
    );
}

/// Errors raised while rendering a frame
///
/// Error code range: 4001-4002
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The render target could not push the frame to the device
    FlushFailed { reason: String },

    /// The shared render surface stayed locked past the bounded wait
    LockTimeout { waited_ms: u64 },
}

impl ErrorCode for DisplayError {
    fn code(&self) -> i32 {
        match self {
            DisplayError::FlushFailed { .. } => 4001,
            DisplayError::LockTimeout { .. } => 4002,
        }
    }

    fn message(&self) -> String {
        match self {
            DisplayError::FlushFailed { reason } => format!("Flush failed: {}", reason),
            DisplayError::LockTimeout { waited_ms } => {
                format!("Render surface still locked after {} ms", waited_ms)
            }
        }
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DisplayError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DisplayError {}
