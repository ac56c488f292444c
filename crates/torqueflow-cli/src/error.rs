//! Error types for the torqueflow CLI

use thiserror::Error;
use torqueflow_errors::{TorqueFlowError, ValidationError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Settings file not found: {0}")]
    SettingsNotFound(String),

    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Engine error: {0}")]
    EngineError(#[from] TorqueFlowError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::SettingsNotFound(_) => 3,
            CliError::ValidationError(_)
            | CliError::UnsupportedFormat(_)
            | CliError::JsonError(_)
            | CliError::YamlError(_) => 4,
            CliError::EngineError(_) => 5,
            CliError::InvalidArgument(_) => 2,
            CliError::IoError(_) => 1,
        }
    }
}
