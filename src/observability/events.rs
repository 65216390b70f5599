//! Observable events
//!
//! Every log line carries an `event` field naming one of these.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// HTTP server bound and serving
    Serving,
    /// Server stopped
    ShutdownComplete,

    // Token operations
    /// Access token issued
    TokenIssued,
    /// Token request refused
    TokenRejected,

    // File operations
    /// Files of a record listed
    FilesListed,
    /// One container listed by a provider
    ContainerListed,
    /// File deletion requested
    FileDeleted,
    /// Blob delete issued to the backend
    BlobDeleted,

    // Failures
    /// Request failed with a client error
    RequestRejected,
    /// Request failed with a server or backend error
    RequestFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "SERVER_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::TokenIssued => "TOKEN_ISSUED",
            Event::TokenRejected => "TOKEN_REJECTED",

            Event::FilesListed => "FILES_LISTED",
            Event::ContainerListed => "CONTAINER_LISTED",
            Event::FileDeleted => "FILE_DELETED",
            Event::BlobDeleted => "BLOB_DELETED",

            Event::RequestRejected => "REQUEST_REJECTED",
            Event::RequestFailed => "REQUEST_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
