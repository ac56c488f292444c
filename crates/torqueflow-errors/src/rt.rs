//! Tick-path error codes.
//!
//! Every variant is a single byte so the RT thread can return, count and
//! forward errors without allocating.

use core::fmt;

use crate::common::ErrorSeverity;

/// Errors raised inside the fixed-rate tick.
///
/// # Examples
///
/// ```
/// use torqueflow_errors::{ErrorSeverity, RTError};
///
/// let err = RTError::DeviceWriteFailed;
/// assert_eq!(err.code(), 2);
/// assert_eq!(err.severity(), ErrorSeverity::Error);
/// assert!(err.requires_safety_action());
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RTError {
    /// The bound output device went away mid-session
    DeviceLost = 1,
    /// Writing a force command to the device failed
    DeviceWriteFailed = 2,
    /// The per-tick computation panicked or produced an unusable value
    PipelineFault = 3,
    /// Scheduler jitter exceeded the allowed threshold
    TimingViolation = 4,
    /// Real-time thread setup could not be applied
    RTSetupFailed = 5,
    /// A tick started after its deadline
    DeadlineMissed = 6,
}

impl RTError {
    /// Numeric error code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Severity used by the engine when deciding how loudly to log.
    pub fn severity(self) -> ErrorSeverity {
        match self {
            RTError::DeviceLost => ErrorSeverity::Critical,
            RTError::DeviceWriteFailed => ErrorSeverity::Error,
            RTError::PipelineFault => ErrorSeverity::Error,
            RTError::TimingViolation => ErrorSeverity::Warning,
            RTError::RTSetupFailed => ErrorSeverity::Critical,
            RTError::DeadlineMissed => ErrorSeverity::Warning,
        }
    }

    /// Whether the tick must stop driving the device in response.
    ///
    /// Errors in this set force the pipeline into its suspended state so the
    /// binding is released and retried after the unsuspend window.
    pub fn requires_safety_action(self) -> bool {
        matches!(
            self,
            RTError::DeviceLost | RTError::DeviceWriteFailed | RTError::PipelineFault
        )
    }

    /// Whether the RT loop keeps running after this error.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, RTError::RTSetupFailed)
    }

    /// Decode a numeric error code.
    ///
    /// ```
    /// use torqueflow_errors::RTError;
    ///
    /// assert_eq!(RTError::from_code(3), Some(RTError::PipelineFault));
    /// assert_eq!(RTError::from_code(0), None);
    /// ```
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RTError::DeviceLost),
            2 => Some(RTError::DeviceWriteFailed),
            3 => Some(RTError::PipelineFault),
            4 => Some(RTError::TimingViolation),
            5 => Some(RTError::RTSetupFailed),
            6 => Some(RTError::DeadlineMissed),
            _ => None,
        }
    }
}

impl fmt::Display for RTError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTError::DeviceLost => write!(f, "Output device lost"),
            RTError::DeviceWriteFailed => write!(f, "Force command write failed"),
            RTError::PipelineFault => write!(f, "Torque pipeline fault"),
            RTError::TimingViolation => write!(f, "Real-time timing violation"),
            RTError::RTSetupFailed => write!(f, "Failed to apply real-time setup"),
            RTError::DeadlineMissed => write!(f, "Tick deadline missed"),
        }
    }
}

impl std::error::Error for RTError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(RTError::DeviceLost.code(), 1);
        assert_eq!(RTError::DeadlineMissed.code(), 6);
    }

    #[test]
    fn test_from_code_covers_every_variant() {
        for code in 1..=6u8 {
            let err = RTError::from_code(code);
            assert_eq!(err.map(RTError::code), Some(code));
        }
        assert_eq!(RTError::from_code(7), None);
    }

    #[test]
    fn test_safety_action_set() {
        assert!(RTError::DeviceLost.requires_safety_action());
        assert!(RTError::PipelineFault.requires_safety_action());
        assert!(!RTError::TimingViolation.requires_safety_action());
        assert!(!RTError::DeadlineMissed.requires_safety_action());
    }

    #[test]
    fn test_only_setup_failure_is_fatal() {
        assert!(!RTError::RTSetupFailed.is_recoverable());
        assert!(RTError::DeviceLost.is_recoverable());
    }

    #[test]
    fn test_rt_error_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<RTError>();
        assert_eq!(core::mem::size_of::<RTError>(), 1);
    }
}
