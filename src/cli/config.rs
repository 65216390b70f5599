//! Configuration file
//!
//! JSON, every field optional except `tables`. Validated on load.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::file_storage::{
    AzureBlobProvider, BlobClient, DefaultContainerResolver, FileAccessService, FileScopePolicy,
    LocalBlobClient, MemoryBlobClient, RecordScopePolicy, ScopePolicy, StorageProvider,
    DEFAULT_CONNECTION_STRING_NAME,
};
use crate::http_server::HttpServerConfig;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub server: HttpServerConfig,

    /// Environment variable holding the storage connection string
    #[serde(default = "default_connection_string_name")]
    pub connection_string_name: String,

    #[serde(default)]
    pub container_prefix: String,

    #[serde(default)]
    pub container_suffix: String,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

fn default_connection_string_name() -> String {
    DEFAULT_CONNECTION_STRING_NAME.to_string()
}

/// Where blobs are kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    #[default]
    Memory,
    Local { root: PathBuf },
}

/// One table whose records carry files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    #[serde(default)]
    pub scope: ScopeConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeConfig {
    #[default]
    Record,
    File,
}

impl ScopeConfig {
    pub fn policy(self) -> Arc<dyn ScopePolicy> {
        match self {
            ScopeConfig::Record => Arc::new(RecordScopePolicy),
            ScopeConfig::File => Arc::new(FileScopePolicy),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.connection_string_name.trim().is_empty() {
            return Err(CliError::config_error("connection_string_name may not be empty"));
        }

        if self.tables.is_empty() {
            return Err(CliError::config_error("At least one table must be configured"));
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(CliError::config_error("Table name may not be empty"));
            }
            if !seen.insert(table.name.to_lowercase()) {
                return Err(CliError::config_error(format!(
                    "Duplicate table: '{}'",
                    table.name
                )));
            }
        }

        if let BackendConfig::Local { root } = &self.backend {
            if root.as_os_str().is_empty() {
                return Err(CliError::config_error("Local backend root may not be empty"));
            }
        }

        Ok(())
    }

    /// Table entry matching `name` case-insensitively
    pub fn table(&self, name: &str) -> CliResult<&TableConfig> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CliError::invalid_argument(format!("Unknown table: '{}'", name)))
    }

    pub fn blob_client(&self) -> Arc<dyn BlobClient> {
        match &self.backend {
            BackendConfig::Memory => Arc::new(MemoryBlobClient::new()),
            BackendConfig::Local { root } => Arc::new(LocalBlobClient::new(root.clone())),
        }
    }

    /// Provider reading its connection string from the configured variable
    pub fn provider(&self, client: Arc<dyn BlobClient>) -> CliResult<Arc<dyn StorageProvider>> {
        let provider = AzureBlobProvider::from_env(&self.connection_string_name, client)?;
        Ok(Arc::new(provider))
    }

    /// Service for one table, sharing `provider` with the others
    pub fn service(
        &self,
        table: &TableConfig,
        provider: Arc<dyn StorageProvider>,
    ) -> CliResult<FileAccessService> {
        let resolver =
            DefaultContainerResolver::with_affixes(&self.container_prefix, &self.container_suffix);
        Ok(FileAccessService::new(&table.name, provider)?
            .with_scope_policy(table.scope.policy())
            .with_resolver(Arc::new(resolver)))
    }

    /// One service per configured table
    pub fn services(&self) -> CliResult<Vec<FileAccessService>> {
        let provider = self.provider(self.blob_client())?;
        self.tables
            .iter()
            .map(|t| self.service(t, provider.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::TokenScope;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(r#"{"tables": [{"name": "Notes"}]}"#).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 54321);
        assert_eq!(config.connection_string_name, DEFAULT_CONNECTION_STRING_NAME);
        assert_eq!(config.backend, BackendConfig::Memory);
        assert_eq!(config.tables[0].scope, ScopeConfig::Record);
        assert!(config.container_prefix.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_json(
            r#"{
                "host": "127.0.0.1",
                "port": 8080,
                "connection_string_name": "STORAGE",
                "container_prefix": "app-",
                "backend": {"kind": "local", "root": "/var/lib/recordfiles"},
                "tables": [{"name": "Notes", "scope": "file"}, {"name": "Orders"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.server.socket_addr(), "127.0.0.1:8080");
        assert_eq!(
            config.backend,
            BackendConfig::Local {
                root: PathBuf::from("/var/lib/recordfiles")
            }
        );
        assert_eq!(config.table("notes").unwrap().scope, ScopeConfig::File);
        assert!(config.table("Invoices").is_err());
    }

    #[test]
    fn test_validation_failures() {
        assert!(Config::from_json("{}").is_err());
        assert!(Config::from_json(r#"{"tables": [{"name": ""}]}"#).is_err());
        assert!(Config::from_json(r#"{"tables": [{"name": "Notes"}, {"name": "NOTES"}]}"#).is_err());
        assert!(Config::from_json(r#"{"tables": [{"name": "Notes", "scope": "row"}]}"#).is_err());
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/recordfiles.json")).unwrap_err();
        assert_eq!(err.code_str(), "RECORDFILES_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_missing_connection_string() {
        let config = Config::from_json(
            r#"{"connection_string_name": "RECORDFILES_TEST_UNSET_VAR", "tables": [{"name": "Notes"}]}"#,
        )
        .unwrap();
        let err = config.services().unwrap_err();
        assert_eq!(err.code_str(), "RECORDFILES_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_services_carry_table_scope() {
        std::env::set_var("RECORDFILES_TEST_CONFIG_CONN", "UseDevelopmentStorage=true");
        let config = Config::from_json(
            r#"{
                "connection_string_name": "RECORDFILES_TEST_CONFIG_CONN",
                "tables": [{"name": "Notes", "scope": "file"}, {"name": "Orders"}]
            }"#,
        )
        .unwrap();

        let services = config.services().unwrap();
        assert_eq!(services.len(), 2);

        let request = crate::file_storage::TokenRequest::default();
        assert_eq!(services[0].determine_scope("abc", &request), TokenScope::File);
        assert_eq!(services[1].determine_scope("abc", &request), TokenScope::Record);
    }
}
