//! CLI-specific error types
//!
//! All CLI errors are fatal: the message goes to stderr and the process exits
//! non-zero.

use std::fmt;
use std::io;

use crate::file_storage::StorageError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or credential error
    ConfigError,
    /// I/O error (stdout, runtime)
    IoError,
    /// Command arguments rejected
    InvalidArgument,
    /// Storage operation failed
    StorageFailed,
    /// Server failed to start or crashed
    BootFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RECORDFILES_CLI_CONFIG_ERROR",
            Self::IoError => "RECORDFILES_CLI_IO_ERROR",
            Self::InvalidArgument => "RECORDFILES_CLI_INVALID_ARGUMENT",
            Self::StorageFailed => "RECORDFILES_CLI_STORAGE_FAILED",
            Self::BootFailed => "RECORDFILES_CLI_BOOT_FAILED",
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

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

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

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        let code = match e {
            StorageError::Configuration(_) => CliErrorCode::ConfigError,
            StorageError::InvalidArgument(_) | StorageError::UnknownTable(_) => {
                CliErrorCode::InvalidArgument
            }
            _ => CliErrorCode::StorageFailed,
        };
        Self::new(code, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("tables may not be empty");
        assert_eq!(
            err.to_string(),
            "RECORDFILES_CLI_CONFIG_ERROR: tables may not be empty"
        );
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: CliError = StorageError::Configuration("missing".into()).into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);

        let err: CliError = StorageError::UnknownTable("Orders".into()).into();
        assert_eq!(err.code_str(), "RECORDFILES_CLI_INVALID_ARGUMENT");

        let err: CliError = StorageError::Backend("down".into()).into();
        assert_eq!(err.code(), &CliErrorCode::StorageFailed);
        assert!(err.message().contains("down"));
    }
}
