//! # File Access Service
//!
//! Binds a table to its scope policy, default container resolver and storage
//! providers, and answers token, listing and deletion requests for records of
//! that table.

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{info, warn};

use super::errors::{StorageError, StorageResult};
use super::file::FileRecord;
use super::permissions::TokenScope;
use super::provider::StorageProvider;
use super::resolver::{ContainerResolver, DefaultContainerResolver};
use super::token::{AccessToken, TokenRequest};
use crate::observability::Event;

/// Decides the scope granted for a token request
pub trait ScopePolicy: Send + Sync + Debug {
    fn determine_scope(&self, entity_id: &str, request: &TokenRequest) -> TokenScope;
}

/// Grants tokens for the whole record
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordScopePolicy;

impl ScopePolicy for RecordScopePolicy {
    fn determine_scope(&self, _entity_id: &str, _request: &TokenRequest) -> TokenScope {
        TokenScope::Record
    }
}

/// Grants tokens for the single target file only
#[derive(Debug, Default, Clone, Copy)]
pub struct FileScopePolicy;

impl ScopePolicy for FileScopePolicy {
    fn determine_scope(&self, _entity_id: &str, _request: &TokenRequest) -> TokenScope {
        TokenScope::File
    }
}

/// Token, listing and deletion operations for the files of one table
pub struct FileAccessService {
    table_name: String,
    provider: Arc<dyn StorageProvider>,
    alternates: Vec<Arc<dyn StorageProvider>>,
    scope_policy: Arc<dyn ScopePolicy>,
    resolver: Arc<dyn ContainerResolver>,
}

impl FileAccessService {
    /// Service for `table_name` backed by `provider`, with record scope and
    /// the default resolver
    pub fn new(table_name: impl Into<String>, provider: Arc<dyn StorageProvider>) -> StorageResult<Self> {
        let table_name = table_name.into();
        if table_name.is_empty() {
            return Err(StorageError::invalid_argument("tableName"));
        }

        Ok(Self {
            table_name,
            provider,
            alternates: Vec::new(),
            scope_policy: Arc::new(RecordScopePolicy),
            resolver: Arc::new(DefaultContainerResolver::new()),
        })
    }

    pub fn with_scope_policy(mut self, policy: Arc<dyn ScopePolicy>) -> Self {
        self.scope_policy = policy;
        self
    }

    /// Resolver used when an operation is not given one
    pub fn with_resolver(mut self, resolver: Arc<dyn ContainerResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Register an additional provider selectable by name
    pub fn with_provider(mut self, provider: Arc<dyn StorageProvider>) -> Self {
        self.alternates.push(provider);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn determine_scope(&self, entity_id: &str, request: &TokenRequest) -> TokenScope {
        self.scope_policy.determine_scope(entity_id, request)
    }

    fn resolver<'a>(&'a self, resolver: Option<&'a dyn ContainerResolver>) -> &'a dyn ContainerResolver {
        resolver.unwrap_or(self.resolver.as_ref())
    }

    fn select_provider(&self, name: Option<&str>) -> StorageResult<&dyn StorageProvider> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(self.provider.as_ref()),
            Some(name) => std::iter::once(&self.provider)
                .chain(self.alternates.iter())
                .find(|p| p.name().eq_ignore_ascii_case(name))
                .map(|p| p.as_ref())
                .ok_or_else(|| StorageError::InvalidArgument(format!("unknown provider: {}", name))),
        }
    }

    fn check_target(&self, entity_id: &str, request: &TokenRequest) -> StorageResult<()> {
        if entity_id.is_empty() {
            return Err(StorageError::invalid_argument("entityId"));
        }
        let Some(target) = request.target_file.details() else {
            return Err(StorageError::InvalidArgument("token request has no target file".into()));
        };
        if target.parent_id() != entity_id {
            return Err(StorageError::InvalidArgument(format!(
                "target file belongs to record '{}', not '{}'",
                target.parent_id(),
                entity_id
            )));
        }
        if !target.table_name().eq_ignore_ascii_case(&self.table_name) {
            return Err(StorageError::InvalidArgument(format!(
                "target file belongs to table '{}', not '{}'",
                target.table_name(),
                self.table_name
            )));
        }
        Ok(())
    }

    /// Issue a token for `request` on record `entity_id`
    pub async fn issue_token(
        &self,
        entity_id: &str,
        request: &TokenRequest,
        resolver: Option<&dyn ContainerResolver>,
    ) -> StorageResult<AccessToken> {
        let provider = match self
            .check_target(entity_id, request)
            .and_then(|()| self.select_provider(request.provider_name.as_deref()))
        {
            Ok(provider) => provider,
            Err(e) => {
                warn!(
                    event = Event::TokenRejected.as_str(),
                    table = %self.table_name,
                    entity_id,
                    error = %e
                );
                return Err(e);
            }
        };
        let scope = self.determine_scope(entity_id, request);

        let token = provider
            .issue_access_token(request, scope, self.resolver(resolver))
            .await?;

        info!(
            event = Event::TokenIssued.as_str(),
            table = %self.table_name,
            entity_id,
            provider = provider.name(),
            scope = ?scope,
            permissions = request.permissions.bits()
        );
        Ok(token)
    }

    /// List the files of record `entity_id`
    pub async fn list_files(
        &self,
        entity_id: &str,
        resolver: Option<&dyn ContainerResolver>,
    ) -> StorageResult<Vec<FileRecord>> {
        let files = self
            .provider
            .list_record_files(&self.table_name, entity_id, self.resolver(resolver))
            .await?;

        info!(
            event = Event::FilesListed.as_str(),
            table = %self.table_name,
            entity_id,
            count = files.len()
        );
        Ok(files)
    }

    /// Delete file `file_name` of record `entity_id`
    pub async fn delete_file(
        &self,
        entity_id: &str,
        file_name: &str,
        resolver: Option<&dyn ContainerResolver>,
    ) -> StorageResult<()> {
        self.provider
            .delete_file(&self.table_name, entity_id, file_name, self.resolver(resolver))
            .await?;

        info!(
            event = Event::FileDeleted.as_str(),
            table = %self.table_name,
            entity_id,
            file_name
        );
        Ok(())
    }
}

impl Debug for FileAccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAccessService")
            .field("table_name", &self.table_name)
            .field("provider", &self.provider.name())
            .field(
                "alternates",
                &self.alternates.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("scope_policy", &self.scope_policy)
            .field("resolver", &self.resolver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::file::FileDetails;
    use crate::file_storage::memory::MemoryBlobClient;
    use crate::file_storage::permissions::Permissions;
    use crate::file_storage::provider::AzureBlobProvider;
    use crate::observability::capture::CapturedLogs;

    fn service() -> FileAccessService {
        let provider = AzureBlobProvider::new(
            "UseDevelopmentStorage=true",
            Arc::new(MemoryBlobClient::new()),
        )
        .unwrap();
        FileAccessService::new("Notes", Arc::new(provider)).unwrap()
    }

    fn request(table: &str, parent: &str) -> TokenRequest {
        TokenRequest::new(
            Permissions::READ,
            FileDetails::target(table, parent, "photo.png").unwrap().into(),
        )
    }

    #[test]
    fn test_default_scope_is_record() {
        assert_eq!(
            service().determine_scope("abc", &request("Notes", "abc")),
            TokenScope::Record
        );
    }

    #[test]
    fn test_scope_policy_override() {
        let service = service().with_scope_policy(Arc::new(FileScopePolicy));
        assert_eq!(
            service.determine_scope("abc", &request("Notes", "abc")),
            TokenScope::File
        );
    }

    #[tokio::test]
    async fn test_mismatched_target_rejected() {
        let service = service();
        let wrong_record = service.issue_token("abc", &request("Notes", "xyz"), None).await;
        assert!(matches!(wrong_record, Err(StorageError::InvalidArgument(_))));

        let wrong_table = service.issue_token("abc", &request("Orders", "abc"), None).await;
        assert!(matches!(wrong_table, Err(StorageError::InvalidArgument(_))));

        let same_table_other_case = service.issue_token("abc", &request("notes", "abc"), None).await;
        assert!(same_table_other_case.is_ok());
    }

    #[tokio::test]
    async fn test_provider_selection() {
        let service = service();
        let named = request("Notes", "abc").with_provider("microsoft azure blob storage");
        assert!(service.issue_token("abc", &named, None).await.is_ok());

        let unknown = request("Notes", "abc").with_provider("S3");
        assert!(matches!(
            service.issue_token("abc", &unknown, None).await,
            Err(StorageError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_rejections_are_logged() {
        let logs = CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(logs.subscriber());
        let service = service();

        let wrong_record = service.issue_token("abc", &request("Notes", "xyz"), None).await;
        assert!(wrong_record.is_err());
        let unknown_provider = request("Notes", "abc").with_provider("S3");
        assert!(service.issue_token("abc", &unknown_provider, None).await.is_err());
        assert!(service.issue_token("abc", &request("Notes", "abc"), None).await.is_ok());

        let events = logs.events();
        let rejected = events.iter().filter(|e| *e == "TOKEN_REJECTED").count();
        assert_eq!(rejected, 2);
        assert_eq!(events.last().map(String::as_str), Some("TOKEN_ISSUED"));
    }

    #[test]
    fn test_empty_table_rejected() {
        let provider =
            AzureBlobProvider::new("UseDevelopmentStorage=true", Arc::new(MemoryBlobClient::new()))
                .unwrap();
        assert!(FileAccessService::new("", Arc::new(provider)).is_err());
    }
}
