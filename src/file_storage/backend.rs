//! # Blob Client Trait
//!
//! Network-facing operations of a blob storage account. Signing is done
//! locally; only listing, provisioning and deletion reach the backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::StorageResult;

/// One entry of a container listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobItem {
    pub name: String,
    pub length: u64,
    pub content_hash: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
}

/// Backend trait for blob containers
#[async_trait]
pub trait BlobClient: Send + Sync + std::fmt::Debug {
    /// Create the container unless it already exists
    async fn create_container_if_not_exists(&self, container: &str) -> StorageResult<()>;

    /// List blobs of a container, with metadata, in backend order
    async fn list_blobs(&self, container: &str) -> StorageResult<Vec<BlobItem>>;

    /// Delete a blob; returns whether it existed
    async fn delete_blob_if_exists(&self, container: &str, blob: &str) -> StorageResult<bool>;
}
