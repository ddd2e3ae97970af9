//! CLI-specific error types
//!
//! Wraps the subsystem errors so every failure leaves the process as one
//! `{"status":"error"}` line carrying the subsystem's own code.

use std::fmt;
use std::io;

use crate::eval::EvalError;
use crate::filter::{ConfigError, FilterError, FilterErrorCode};
use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdin/stdout)
    IoError,
    /// Input is not valid JSON
    InvalidInput,
    /// Schema failed to load or validate
    SchemaError,
    /// Entity not present in the schema
    UnknownEntity,
    /// Predicate rejected by the compiler
    Filter(FilterErrorCode),
    /// Dataset evaluation failed
    EvalError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "AERO_CLI_CONFIG_ERROR",
            Self::IoError => "AERO_CLI_IO_ERROR",
            Self::InvalidInput => "AERO_CLI_INVALID_INPUT",
            Self::SchemaError => "AERO_CLI_SCHEMA_ERROR",
            Self::UnknownEntity => "AERO_CLI_UNKNOWN_ENTITY",
            Self::Filter(code) => code.code(),
            Self::EvalError => "AERO_CLI_EVAL_ERROR",
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

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn unknown_entity(entity: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownEntity,
            format!("Entity '{}' is not defined in the schema", entity),
        )
    }

    /// Filter error with the field names stripped unless `verbose`
    pub fn filter(err: &FilterError, verbose: bool) -> Self {
        let message = if verbose {
            err.diagnostic()
        } else {
            err.code().public_message().to_string()
        };
        Self::new(CliErrorCode::Filter(err.code()), message)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
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
        Self::new(CliErrorCode::InvalidInput, format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<EvalError> for CliError {
    fn from(e: EvalError) -> Self {
        Self::new(CliErrorCode::EvalError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
