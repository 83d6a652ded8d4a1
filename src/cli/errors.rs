//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::causality::CausalityError;
use crate::config::ConfigError;
use crate::features::FeatureError;
use crate::log::LogError;
use crate::model::ModelError;
use crate::transform::TransformError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Event log could not be loaded
    LogError,
    /// Feature extraction failed
    ExtractionError,
    /// Split or transformation failed
    TransformError,
    /// Model training or evaluation failed
    ModelError,
    /// Hypothesis evaluation could not start
    CausalityError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "TC_CLI_CONFIG_ERROR",
            Self::IoError => "TC_CLI_IO_ERROR",
            Self::LogError => "TC_CLI_LOG_ERROR",
            Self::ExtractionError => "TC_CLI_EXTRACTION_ERROR",
            Self::TransformError => "TC_CLI_TRANSFORM_ERROR",
            Self::ModelError => "TC_CLI_MODEL_ERROR",
            Self::CausalityError => "TC_CLI_CAUSALITY_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<LogError> for CliError {
    fn from(e: LogError) -> Self {
        Self::new(CliErrorCode::LogError, e.to_string())
    }
}

impl From<FeatureError> for CliError {
    fn from(e: FeatureError) -> Self {
        Self::new(CliErrorCode::ExtractionError, e.to_string())
    }
}

impl From<TransformError> for CliError {
    fn from(e: TransformError) -> Self {
        Self::new(CliErrorCode::TransformError, e.to_string())
    }
}

impl From<ModelError> for CliError {
    fn from(e: ModelError) -> Self {
        Self::new(CliErrorCode::ModelError, e.to_string())
    }
}

impl From<CausalityError> for CliError {
    fn from(e: CausalityError) -> Self {
        Self::new(CliErrorCode::CausalityError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
