//! Unified error handling for the UV sensor HAL
//!
//! One error type covers construction, read-cycle, and node-write failures.
//! Uses thiserror for ergonomic definitions with proper Display and Error
//! trait impls.

use std::io;
use std::path::PathBuf;

use crate::node::AccessMethod;

/// Result type alias using HalError
pub type Result<T> = std::result::Result<T, HalError>;

/// Unified error type for all HAL operations
#[derive(thiserror::Error, Debug)]
pub enum HalError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Construction-fatal errors
    // ============================================================================
    #[error("No {sensor_type} device node matches key '{key}'")]
    NoSuchDevice {
        sensor_type: String,
        key: String,
    },

    #[error("Access method {method:?} is not supported")]
    UnsupportedMethod {
        method: AccessMethod,
    },

    #[error("Monotonic clock mode rejected by {path}")]
    ClockModeUnsupported {
        path: PathBuf,
    },

    #[error("Missing calibration field '{field}' for model '{model}'")]
    MissingCalibrationField {
        model: String,
        field: &'static str,
    },

    // ============================================================================
    // Read-cycle errors
    // ============================================================================
    #[error("Short read from event node: got {got} bytes, want {want}")]
    ShortRead {
        got: usize,
        want: usize,
    },

    #[error("Unknown input event (type = {event_type}, code = {code})")]
    UnknownEvent {
        event_type: u16,
        code: u16,
    },

    // ============================================================================
    // Node write errors
    // ============================================================================
    #[error("Failed to write {path}: {reason}")]
    NodeWrite {
        path: PathBuf,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HalError::NoSuchDevice {
            sensor_type: "ULTRAVIOLET".to_string(),
            key: "uv_sensor".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "No ULTRAVIOLET device node matches key 'uv_sensor'"
        );

        let err = HalError::MissingCalibrationField {
            model: "maru_sensor_uv_1".to_string(),
            field: "vendor",
        };
        assert!(format!("{}", err).contains("vendor"));
        assert!(format!("{}", err).contains("maru_sensor_uv_1"));

        let err = HalError::ShortRead { got: 7, want: 24 };
        assert_eq!(
            format!("{}", err),
            "Short read from event node: got 7 bytes, want 24"
        );

        let err = HalError::UnknownEvent { event_type: 3, code: 5 };
        assert!(format!("{}", err).contains("type = 3"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let err: HalError = io_err.into();
        assert!(matches!(err, HalError::Io(_)));
    }
}
