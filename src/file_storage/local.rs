//! # Local Filesystem Blob Client
//!
//! Containers are directories under a root; blob names containing `/` map to
//! nested files.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::fs;

use super::backend::{BlobClient, BlobItem};
use super::errors::{StorageError, StorageResult};

/// Local filesystem blob client
#[derive(Debug)]
pub struct LocalBlobClient {
    root: PathBuf,
}

impl LocalBlobClient {
    /// Create a new local client rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn container_path(&self, container: &str) -> StorageResult<PathBuf> {
        if container.is_empty() || container.contains(['/', '\\']) || container == ".." {
            return Err(StorageError::InvalidArgument(format!(
                "invalid container name: {}",
                container
            )));
        }
        Ok(self.root.join(container))
    }

    fn blob_path(&self, container: &str, blob: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(blob);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if blob.is_empty() || escapes {
            return Err(StorageError::InvalidArgument(format!("invalid blob name: {}", blob)));
        }
        Ok(self.container_path(container)?.join(relative))
    }

    async fn describe(path: &Path, name: String) -> StorageResult<BlobItem> {
        let data = fs::read(path).await?;
        let modified = fs::metadata(path).await?.modified().ok();

        Ok(BlobItem {
            name,
            length: data.len() as u64,
            content_hash: Some(STANDARD.encode(Sha256::digest(&data))),
            last_modified: modified.map(DateTime::<Utc>::from),
            metadata: HashMap::new(),
        })
    }
}

#[async_trait]
impl BlobClient for LocalBlobClient {
    async fn create_container_if_not_exists(&self, container: &str) -> StorageResult<()> {
        fs::create_dir_all(self.container_path(container)?).await?;
        Ok(())
    }

    async fn list_blobs(&self, container: &str) -> StorageResult<Vec<BlobItem>> {
        let container_root = self.container_path(container)?;
        if !fs::try_exists(&container_root).await? {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut pending = vec![container_root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&container_root) else {
                    continue;
                };
                let name = relative
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect::<Vec<_>>()
                    .join("/");
                results.push(Self::describe(&path, name).await?);
            }
        }

        results.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(results)
    }

    async fn delete_blob_if_exists(&self, container: &str, blob: &str) -> StorageResult<bool> {
        let full_path = self.blob_path(container, blob)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}
