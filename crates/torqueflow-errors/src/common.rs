//! Top-level error type and classification.

use core::fmt;

use crate::{DeviceError, RTError, ValidationError};

/// Top-level error type wrapping every TorqueFlow error.
#[derive(Debug, thiserror::Error)]
pub enum TorqueFlowError {
    /// Tick-path errors
    #[error("RT error: {0}")]
    RT(#[from] RTError),

    /// Device errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Settings validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Engine configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine lifecycle errors (start/stop)
    #[error("Engine error: {0}")]
    Engine(String),
}

impl TorqueFlowError {
    /// Error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TorqueFlowError::RT(_) => ErrorCategory::RT,
            TorqueFlowError::Device(_) => ErrorCategory::Device,
            TorqueFlowError::Validation(_) => ErrorCategory::Validation,
            TorqueFlowError::Io(_) => ErrorCategory::IO,
            TorqueFlowError::Config(_) => ErrorCategory::Config,
            TorqueFlowError::Engine(_) => ErrorCategory::Engine,
        }
    }

    /// Error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TorqueFlowError::RT(e) => e.severity(),
            TorqueFlowError::Device(e) => e.severity(),
            TorqueFlowError::Validation(e) => e.severity(),
            TorqueFlowError::Io(_) => ErrorSeverity::Error,
            TorqueFlowError::Config(_) => ErrorSeverity::Error,
            TorqueFlowError::Engine(_) => ErrorSeverity::Error,
        }
    }

    /// Whether the caller may retry.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        TorqueFlowError::Config(msg.into())
    }

    /// Create an engine lifecycle error.
    pub fn engine(msg: impl Into<String>) -> Self {
        TorqueFlowError::Engine(msg.into())
    }
}

impl From<std::io::Error> for TorqueFlowError {
    fn from(e: std::io::Error) -> Self {
        TorqueFlowError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Tick-path errors
    RT = 0,
    /// Device errors
    Device = 1,
    /// Configuration errors
    Config = 2,
    /// I/O errors
    IO = 3,
    /// Validation errors
    Validation = 4,
    /// Engine lifecycle errors
    Engine = 5,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::RT => write!(f, "RT"),
            ErrorCategory::Device => write!(f, "Device"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Engine => write!(f, "Engine"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, output must stop
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Adds an operation name to an error on its way up.
pub trait ResultExt<T> {
    /// Wrap the error with the name of the failed operation.
    fn with_operation(self, operation: &str) -> Result<T, TorqueFlowError>;
}

impl<T, E: Into<TorqueFlowError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_operation(self, operation: &str) -> Result<T, TorqueFlowError> {
        self.map_err(|e| {
            let err: TorqueFlowError = e.into();
            TorqueFlowError::Engine(format!("{operation}: {err}"))
        })
    }
}
