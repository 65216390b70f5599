//! # In-Memory Blob Client
//!
//! Keeps containers and blobs in process memory. Used for tests and for
//! running the server without a storage account.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use sha2::{Digest, Sha256};

use super::backend::{BlobClient, BlobItem};
use super::errors::{StorageError, StorageResult};

/// In-memory blob client
#[derive(Debug, Default)]
pub struct MemoryBlobClient {
    containers: RwLock<HashMap<String, BTreeMap<String, BlobItem>>>,
}

impl MemoryBlobClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob, creating its container on demand
    pub fn put_blob(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
        metadata: HashMap<String, String>,
    ) -> StorageResult<BlobItem> {
        let item = BlobItem {
            name: name.to_string(),
            length: data.len() as u64,
            content_hash: Some(STANDARD.encode(Sha256::digest(data))),
            last_modified: Some(Utc::now()),
            metadata,
        };

        let mut containers = self
            .containers
            .write()
            .map_err(|_| StorageError::Backend("Lock poisoned".into()))?;
        containers
            .entry(container.to_string())
            .or_default()
            .insert(name.to_string(), item.clone());
        Ok(item)
    }

    pub fn container_exists(&self, container: &str) -> bool {
        self.containers
            .read()
            .map(|c| c.contains_key(container))
            .unwrap_or(false)
    }

    pub fn blob_exists(&self, container: &str, name: &str) -> bool {
        self.containers
            .read()
            .map(|c| c.get(container).is_some_and(|blobs| blobs.contains_key(name)))
            .unwrap_or(false)
    }
}

#[async_trait]
impl BlobClient for MemoryBlobClient {
    async fn create_container_if_not_exists(&self, container: &str) -> StorageResult<()> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| StorageError::Backend("Lock poisoned".into()))?;
        containers.entry(container.to_string()).or_default();
        Ok(())
    }

    async fn list_blobs(&self, container: &str) -> StorageResult<Vec<BlobItem>> {
        let containers = self
            .containers
            .read()
            .map_err(|_| StorageError::Backend("Lock poisoned".into()))?;
        Ok(containers
            .get(container)
            .map(|blobs| blobs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_blob_if_exists(&self, container: &str, blob: &str) -> StorageResult<bool> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| StorageError::Backend("Lock poisoned".into()))?;
        Ok(containers
            .get_mut(container)
            .and_then(|blobs| blobs.remove(blob))
            .is_some())
    }
}
