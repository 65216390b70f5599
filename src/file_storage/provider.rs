//! # Storage Providers
//!
//! A provider turns abstract scope and permission requests into a concrete
//! backend's signed tokens, and performs the listing and deletion that need
//! backend connectivity.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::debug;

use super::backend::BlobClient;
use super::clock::{Clock, SystemClock};
use super::connection::ConnectionString;
use super::errors::{StorageError, StorageResult};
use super::file::{FileDetails, FileRecord};
use super::permissions::{BlobSasPermissions, TokenScope};
use super::resolver::ContainerResolver;
use super::signed_url::{SasResource, SasSigner};
use super::token::{AccessToken, TokenRequest};
use crate::observability::Event;

/// Lifetime of an issued token, in seconds
pub const TOKEN_VALIDITY_SECS: i64 = 60 * 60;

/// Lifetime of an issued token
pub fn default_token_validity() -> Duration {
    Duration::seconds(TOKEN_VALIDITY_SECS)
}

/// Storage backend capable of issuing tokens, listing and deleting files
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Display name, matched against `TokenRequest::provider_name`
    fn name(&self) -> &str;

    /// All files of a record, container by container in resolver order
    async fn list_record_files(
        &self,
        table_name: &str,
        record_id: &str,
        resolver: &dyn ContainerResolver,
    ) -> StorageResult<Vec<FileRecord>>;

    /// Delete one file; a missing file is not an error
    async fn delete_file(
        &self,
        table_name: &str,
        record_id: &str,
        file_name: &str,
        resolver: &dyn ContainerResolver,
    ) -> StorageResult<()>;

    /// Sign a token for the request's target file or its whole record
    async fn issue_access_token(
        &self,
        request: &TokenRequest,
        scope: TokenScope,
        resolver: &dyn ContainerResolver,
    ) -> StorageResult<AccessToken>;
}

fn require(name: &str, value: &str) -> StorageResult<()> {
    if value.is_empty() {
        Err(StorageError::invalid_argument(name))
    } else {
        Ok(())
    }
}

/// Azure Blob Storage provider; signatures are service SAS tokens
pub struct AzureBlobProvider {
    connection: ConnectionString,
    signer: SasSigner,
    client: Arc<dyn BlobClient>,
    clock: Arc<dyn Clock>,
    token_validity: Duration,
}

impl AzureBlobProvider {
    pub const NAME: &'static str = "Microsoft Azure Blob Storage";

    /// Create a provider for the account in `connection_string`
    pub fn new(connection_string: &str, client: Arc<dyn BlobClient>) -> StorageResult<Self> {
        if connection_string.is_empty() {
            return Err(StorageError::Configuration("connection string is empty".into()));
        }
        let connection = ConnectionString::parse(connection_string)?;

        Ok(Self {
            signer: SasSigner::from_connection(&connection),
            connection,
            client,
            clock: Arc::new(SystemClock),
            token_validity: default_token_validity(),
        })
    }

    /// Create a provider from the connection string stored in environment
    /// variable `name`
    pub fn from_env(name: &str, client: Arc<dyn BlobClient>) -> StorageResult<Self> {
        if name.is_empty() {
            return Err(StorageError::Configuration(
                "connection string name may not be empty".into(),
            ));
        }
        let connection_string = std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                StorageError::Configuration(format!("missing connection string '{}'", name))
            })?;
        Self::new(&connection_string, client)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the token lifetime
    pub fn with_token_validity(mut self, validity: Duration) -> Self {
        self.token_validity = validity;
        self
    }

    pub fn connection(&self) -> &ConnectionString {
        &self.connection
    }

    pub fn signer(&self) -> &SasSigner {
        &self.signer
    }
}

#[async_trait]
impl StorageProvider for AzureBlobProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn list_record_files(
        &self,
        table_name: &str,
        record_id: &str,
        resolver: &dyn ContainerResolver,
    ) -> StorageResult<Vec<FileRecord>> {
        require("tableName", table_name)?;
        require("recordId", record_id)?;

        let containers = resolver.resolve_record_containers(table_name, record_id)?;
        let mut files = Vec::new();

        for container in containers {
            self.client.create_container_if_not_exists(&container).await?;
            let blobs = self.client.list_blobs(&container).await?;
            debug!(
                event = Event::ContainerListed.as_str(),
                container = %container,
                count = blobs.len()
            );

            for item in blobs {
                let store_uri = self.connection.blob_url(&container, &item.name).path().to_string();
                let details = FileDetails::from_blob_item(item, table_name, record_id, store_uri)?;
                files.push(FileRecord::Present(details));
            }
        }

        Ok(files)
    }

    async fn delete_file(
        &self,
        table_name: &str,
        record_id: &str,
        file_name: &str,
        resolver: &dyn ContainerResolver,
    ) -> StorageResult<()> {
        require("tableName", table_name)?;
        require("recordId", record_id)?;
        require("fileName", file_name)?;

        let container = resolver.resolve_file_container(table_name, record_id, file_name)?;
        let existed = self.client.delete_blob_if_exists(&container, file_name).await?;
        debug!(
            event = Event::BlobDeleted.as_str(),
            container = %container,
            existed
        );
        Ok(())
    }

    async fn issue_access_token(
        &self,
        request: &TokenRequest,
        scope: TokenScope,
        resolver: &dyn ContainerResolver,
    ) -> StorageResult<AccessToken> {
        let target = request.target_file.details().ok_or_else(|| {
            StorageError::InvalidArgument("token request has no target file".into())
        })?;

        let container =
            resolver.resolve_file_container(target.table_name(), target.parent_id(), target.name())?;
        // Uploads through a container token need the container to exist
        self.client.create_container_if_not_exists(&container).await?;

        let expires_at = self.clock.now() + self.token_validity;
        let native = BlobSasPermissions::from_permissions(request.permissions);

        let (resource_uri, raw_token) = match scope {
            TokenScope::File => {
                let resource = SasResource::Blob {
                    container: &container,
                    blob: target.name(),
                };
                (
                    self.connection.blob_url(&container, target.name()),
                    self.signer.sign(&resource, native, expires_at)?,
                )
            }
            TokenScope::Record => (
                self.connection.container_url(&container),
                self.signer
                    .sign(&SasResource::Container(&container), native, expires_at)?,
            ),
        };

        AccessToken::new(
            resource_uri,
            target.parent_id(),
            request.permissions,
            scope,
            raw_token,
        )
    }
}
