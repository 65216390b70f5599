//! # Access Tokens
//!
//! The client's token request and the credential issued in response.

use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::{StorageError, StorageResult};
use super::file::FileRecord;
use super::permissions::{Permissions, TokenScope};

/// Client-supplied token request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub target_file: FileRecord,
}

impl TokenRequest {
    pub fn new(permissions: Permissions, target_file: FileRecord) -> Self {
        Self {
            permissions,
            provider_name: None,
            target_file,
        }
    }

    pub fn with_provider(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = Some(provider_name.into());
        self
    }
}

/// Credential bound to one container or blob until its expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    resource_uri: Url,
    entity_id: String,
    permissions: Permissions,
    scope: TokenScope,
    raw_token: String,
}

impl AccessToken {
    pub fn new(
        resource_uri: Url,
        entity_id: impl Into<String>,
        permissions: Permissions,
        scope: TokenScope,
        raw_token: impl Into<String>,
    ) -> StorageResult<Self> {
        let entity_id = entity_id.into();
        let raw_token = raw_token.into();

        if resource_uri.as_str().is_empty() {
            return Err(StorageError::invalid_argument("resourceUri"));
        }
        if entity_id.is_empty() {
            return Err(StorageError::invalid_argument("entityId"));
        }
        if raw_token.is_empty() {
            return Err(StorageError::invalid_argument("rawToken"));
        }

        Ok(Self {
            resource_uri,
            entity_id,
            permissions,
            scope,
            raw_token,
        })
    }

    /// Parse a resource URI string and build the token
    pub fn from_parts(
        resource_uri: &str,
        entity_id: impl Into<String>,
        permissions: Permissions,
        scope: TokenScope,
        raw_token: impl Into<String>,
    ) -> StorageResult<Self> {
        if resource_uri.is_empty() {
            return Err(StorageError::invalid_argument("resourceUri"));
        }
        let resource_uri = Url::parse(resource_uri)
            .map_err(|e| StorageError::InvalidArgument(format!("resourceUri: {}", e)))?;
        Self::new(resource_uri, entity_id, permissions, scope, raw_token)
    }

    pub fn resource_uri(&self) -> &Url {
        &self.resource_uri
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn scope(&self) -> TokenScope {
        self.scope
    }

    pub fn raw_token(&self) -> &str {
        &self.raw_token
    }

    /// Resource URI with the signature appended, ready for direct use
    pub fn signed_url(&self) -> String {
        format!("{}{}", self.resource_uri, self.raw_token)
    }
}
