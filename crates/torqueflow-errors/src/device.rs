//! Output device errors.
//!
//! Raised when the engine acquires, releases or talks to the force feedback
//! device outside the steady-state tick.

use crate::common::ErrorSeverity;

/// Output device errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    /// No device with the requested id is present
    #[error("Device not found: {0}")]
    NotFound(String),

    /// Device was present but stopped responding
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    /// Another process holds the device exclusively
    #[error("Device {0} is busy")]
    Busy(String),

    /// The device refused to create its force effect
    #[error("Failed to acquire device {device}: {reason}")]
    AcquireFailed {
        /// Device identifier
        device: String,
        /// Failure reason reported by the backend
        reason: String,
    },

    /// A force command could not be delivered
    #[error("Communication error with device {device}: {message}")]
    CommunicationError {
        /// Device identifier
        device: String,
        /// Error message
        message: String,
    },

    /// A command was sent with no device bound
    #[error("No device is bound")]
    NotBound,
}

impl DeviceError {
    /// Severity for logging.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeviceError::NotFound(_) => ErrorSeverity::Error,
            DeviceError::Disconnected(_) => ErrorSeverity::Critical,
            DeviceError::Busy(_) => ErrorSeverity::Warning,
            DeviceError::AcquireFailed { .. } => ErrorSeverity::Error,
            DeviceError::CommunicationError { .. } => ErrorSeverity::Error,
            DeviceError::NotBound => ErrorSeverity::Warning,
        }
    }

    /// Whether retrying after the unsuspend cooldown may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeviceError::Busy(_)
                | DeviceError::Disconnected(_)
                | DeviceError::AcquireFailed { .. }
                | DeviceError::CommunicationError { .. }
        )
    }

    /// Create a not found error.
    pub fn not_found(device: impl Into<String>) -> Self {
        DeviceError::NotFound(device.into())
    }

    /// Create a disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        DeviceError::Disconnected(device.into())
    }

    /// Create an acquisition failure.
    pub fn acquire_failed(device: impl Into<String>, reason: impl Into<String>) -> Self {
        DeviceError::AcquireFailed {
            device: device.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(DeviceError::Busy("wheel".into()).is_retryable());
        assert!(DeviceError::acquire_failed("wheel", "effect rejected").is_retryable());
        assert!(!DeviceError::not_found("wheel").is_retryable());
        assert!(!DeviceError::NotBound.is_retryable());
    }

    #[test]
    fn test_display_includes_device() {
        let msg = DeviceError::acquire_failed("0000abcd", "busy").to_string();
        assert!(msg.contains("0000abcd"));
        assert!(msg.contains("busy"));
    }

    #[test]
    fn test_severity() {
        assert_eq!(
            DeviceError::disconnected("wheel").severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(DeviceError::NotBound.severity(), ErrorSeverity::Warning);
    }
}
