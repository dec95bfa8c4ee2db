// Sample capture errors

use crate::error::ErrorCode;
use std::fmt;

/// Log a capture error with structured context
///
/// Capture errors never stop the sampler: the caller logs them here and
/// falls back to direct polling for the current window.
pub fn log_capture_error(err: &CaptureError, context: &str) {
    tracing::warn!(
        code = err.code(),
        component = "Sampler",
        "Capture error in {}: {}",
        context,
        err.message()
    );
}

/// Errors raised by a [`SampleSource`](crate::hal::SampleSource) bulk transfer
///
/// Error code range: 3001-3003
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The source has no hardware-assisted transfer path
    BulkTransferUnavailable,

    /// The transfer was started but aborted by the peripheral
    TransferFailed { reason: String },

    /// The transfer completed with fewer codes than requested
    ShortTransfer { expected: usize, received: usize },
}

impl ErrorCode for CaptureError {
    fn code(&self) -> i32 {
        match self {
            CaptureError::BulkTransferUnavailable => 3001,
            CaptureError::TransferFailed { .. } => 3002,
            CaptureError::ShortTransfer { .. } => 3003,
        }
    }

    fn message(&self) -> String {
        match self {
            CaptureError::BulkTransferUnavailable => {
                "Bulk transfer unavailable on this sample source".to_string()
            }
            CaptureError::TransferFailed { reason } => {
                format!("Bulk transfer failed: {}", reason)
            }
            CaptureError::ShortTransfer { expected, received } => {
                format!(
                    "Bulk transfer short: expected {} codes, received {}",
                    expected, received
                )
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CaptureError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CaptureError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_codes() {
        assert_eq!(CaptureError::BulkTransferUnavailable.code(), 3001);
        assert_eq!(
            CaptureError::TransferFailed {
                reason: "bus".to_string()
            }
            .code(),
            3002
        );
        assert_eq!(
            CaptureError::ShortTransfer {
                expected: 200,
                received: 12
            }
            .code(),
            3003
        );
    }

    #[test]
    fn test_capture_error_display_includes_code() {
        let err = CaptureError::ShortTransfer {
            expected: 200,
            received: 12,
        };
        let text = err.to_string();
        assert!(text.contains("3003"));
        assert!(text.contains("expected 200 codes, received 12"));
    }
}
