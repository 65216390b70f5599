//! # File Storage Errors

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Client errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    // Token errors
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // Backend errors
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl StorageError {
    /// Shorthand for an invalid-argument error naming the offending argument
    pub fn invalid_argument(name: &str) -> Self {
        StorageError::InvalidArgument(format!("'{}' may not be empty", name))
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::Configuration(_) => 500,
            StorageError::InvalidArgument(_) => 400,
            StorageError::UnknownTable(_) => 404,
            StorageError::TokenExpired => 403,
            StorageError::InvalidSignature => 403,
            StorageError::InvalidToken(_) => 403,
            StorageError::Backend(_) => 502,
            StorageError::Io(_) => 500,
        }
    }

    /// Whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StorageError::invalid_argument("tableName").status_code(), 400);
        assert_eq!(StorageError::UnknownTable("notes".into()).status_code(), 404);
        assert_eq!(StorageError::Configuration("missing".into()).status_code(), 500);
        assert_eq!(StorageError::Backend("timeout".into()).status_code(), 502);
        assert_eq!(StorageError::TokenExpired.status_code(), 403);
    }

    #[test]
    fn test_client_errors() {
        assert!(StorageError::invalid_argument("recordId").is_client_error());
        assert!(!StorageError::Backend("down".into()).is_client_error());
        assert!(!StorageError::Configuration("x".into()).is_client_error());
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = StorageError::invalid_argument("fileName");
        assert_eq!(err.to_string(), "Invalid argument: 'fileName' may not be empty");
    }
}
