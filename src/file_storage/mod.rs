//! # File Storage Module
//!
//! Scoped, time-limited access tokens for files attached to data-store
//! records, plus listing and deletion of those files.
//!
//! Files of a record live in backend containers named by a
//! [`ContainerResolver`]. A [`StorageProvider`] signs tokens for one file or a
//! whole container and talks to the backend through a [`BlobClient`].
//! [`FileAccessService`] binds all of it to a table.

pub mod backend;
pub mod clock;
pub mod connection;
pub mod errors;
pub mod file;
pub mod local;
pub mod memory;
pub mod permissions;
pub mod provider;
pub mod resolver;
pub mod service;
pub mod signed_url;
pub mod token;

pub use backend::{BlobClient, BlobItem};
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{ConnectionString, DEFAULT_CONNECTION_STRING_NAME};
pub use errors::{StorageError, StorageResult};
pub use file::{FileDetails, FileRecord};
pub use local::LocalBlobClient;
pub use memory::MemoryBlobClient;
pub use permissions::{BlobSasPermissions, Permissions, TokenScope};
pub use provider::{default_token_validity, AzureBlobProvider, StorageProvider, TOKEN_VALIDITY_SECS};
pub use resolver::{ContainerResolver, DefaultContainerResolver};
pub use service::{FileAccessService, FileScopePolicy, RecordScopePolicy, ScopePolicy};
pub use signed_url::{SasResource, SasSigner, VerifiedSas, SAS_VERSION};
pub use token::{AccessToken, TokenRequest};
