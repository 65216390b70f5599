//! # Storage Account Connection Strings
//!
//! Parses `Key=Value;...` connection strings identifying a blob storage
//! account and the endpoint its containers live under.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use url::Url;

use super::errors::{StorageError, StorageResult};

/// Environment key holding the storage account connection string
pub const DEFAULT_CONNECTION_STRING_NAME: &str = "MS_AzureStorageAccountConnectionString";

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// Parsed storage account connection string
#[derive(Clone)]
pub struct ConnectionString {
    account_name: String,
    account_key: Vec<u8>,
    blob_endpoint: Url,
}

impl ConnectionString {
    /// Parse a connection string
    pub fn parse(s: &str) -> StorageResult<Self> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut endpoint_suffix = None;
        let mut blob_endpoint = None;
        let mut development = false;

        for pair in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                StorageError::Configuration("connection string segment without '='".into())
            })?;
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "defaultendpointsprotocol" => protocol = Some(value.to_string()),
                "accountname" => account_name = Some(value.to_string()),
                "accountkey" => account_key = Some(value.to_string()),
                "endpointsuffix" => endpoint_suffix = Some(value.to_string()),
                "blobendpoint" => blob_endpoint = Some(value.to_string()),
                "usedevelopmentstorage" => development = value.eq_ignore_ascii_case("true"),
                // Endpoints for other services are irrelevant here
                _ => {}
            }
        }

        if development {
            return Self::from_parts(DEV_ACCOUNT_NAME, DEV_ACCOUNT_KEY, DEV_BLOB_ENDPOINT);
        }

        let account_name = account_name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| StorageError::Configuration("connection string has no AccountName".into()))?;
        let account_key = account_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StorageError::Configuration("connection string has no AccountKey".into()))?;

        let endpoint = match blob_endpoint {
            Some(endpoint) => endpoint,
            None => {
                let protocol = protocol.unwrap_or_else(|| "https".to_string());
                let suffix = endpoint_suffix.unwrap_or_else(|| "core.windows.net".to_string());
                format!("{}://{}.blob.{}", protocol, account_name, suffix)
            }
        };

        Self::from_parts(&account_name, &account_key, &endpoint)
    }

    fn from_parts(account_name: &str, account_key: &str, endpoint: &str) -> StorageResult<Self> {
        let account_key = STANDARD
            .decode(account_key)
            .map_err(|_| StorageError::Configuration("AccountKey is not valid base64".into()))?;

        let blob_endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::Configuration(format!("invalid blob endpoint: {}", e)))?;
        if !matches!(blob_endpoint.scheme(), "http" | "https") || blob_endpoint.cannot_be_a_base() {
            return Err(StorageError::Configuration(format!(
                "unsupported blob endpoint: {}",
                endpoint
            )));
        }

        Ok(Self {
            account_name: account_name.to_string(),
            account_key,
            blob_endpoint,
        })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Decoded account key used for signing
    pub fn account_key(&self) -> &[u8] {
        &self.account_key
    }

    pub fn blob_endpoint(&self) -> &Url {
        &self.blob_endpoint
    }

    /// URI of a container
    pub fn container_url(&self, container: &str) -> Url {
        self.url_with_segments(std::iter::once(container))
    }

    /// URI of a blob; `/` in the blob name separates virtual directories
    pub fn blob_url(&self, container: &str, blob: &str) -> Url {
        self.url_with_segments(std::iter::once(container).chain(blob.split('/')))
    }

    fn url_with_segments<'a>(&self, segments: impl Iterator<Item = &'a str>) -> Url {
        let mut url = self.blob_endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .finish()
    }
}
