//! # Container Name Resolution
//!
//! Maps a (table, record, file) identity onto backend container names.
//! Resolution is pure: identical inputs always address the same container.

use std::fmt::Debug;

use super::errors::{StorageError, StorageResult};

/// Resolves container names for record files
pub trait ContainerResolver: Send + Sync + Debug {
    /// Container holding a single file of a record
    fn resolve_file_container(
        &self,
        table_name: &str,
        record_id: &str,
        file_name: &str,
    ) -> StorageResult<String>;

    /// All containers holding files of a record, in listing order
    fn resolve_record_containers(
        &self,
        table_name: &str,
        record_id: &str,
    ) -> StorageResult<Vec<String>>;
}

/// One container per record: `lowercase(prefix + table + "-" + record + suffix)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultContainerResolver {
    prefix: String,
    suffix: String,
}

impl DefaultContainerResolver {
    /// Resolver without prefix or suffix
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with deployment-specific prefix and suffix
    pub fn with_affixes(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    fn container_name(&self, table_name: &str, record_id: &str) -> StorageResult<String> {
        if table_name.is_empty() {
            return Err(StorageError::invalid_argument("tableName"));
        }
        if record_id.is_empty() {
            return Err(StorageError::invalid_argument("recordId"));
        }

        Ok(format!("{}{}-{}{}", self.prefix, table_name, record_id, self.suffix).to_lowercase())
    }
}

impl ContainerResolver for DefaultContainerResolver {
    fn resolve_file_container(
        &self,
        table_name: &str,
        record_id: &str,
        _file_name: &str,
    ) -> StorageResult<String> {
        self.container_name(table_name, record_id)
    }

    fn resolve_record_containers(
        &self,
        table_name: &str,
        record_id: &str,
    ) -> StorageResult<Vec<String>> {
        Ok(vec![self.container_name(table_name, record_id)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_container_name() {
        let resolver = DefaultContainerResolver::new();
        let name = resolver
            .resolve_file_container("Notes", "abc-123", "photo.png")
            .unwrap();
        assert_eq!(name, "notes-abc-123");
    }

    #[test]
    fn test_prefix_and_suffix() {
        let resolver = DefaultContainerResolver::with_affixes("Prod-", "-EU");
        let name = resolver
            .resolve_file_container("TodoItem", "42", "a.txt")
            .unwrap();
        assert_eq!(name, "prod-todoitem-42-eu");
    }

    #[test]
    fn test_file_name_is_ignored() {
        let resolver = DefaultContainerResolver::with_affixes("p", "s");
        let a = resolver.resolve_file_container("Orders", "7", "a.png").unwrap();
        let b = resolver.resolve_file_container("Orders", "7", "b/c.jpg").unwrap();
        let c = resolver.resolve_file_container("Orders", "7", "").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_deterministic_and_lowercase() {
        let resolver = DefaultContainerResolver::with_affixes("X", "Y");
        for (table, record) in [("Notes", "ABC"), ("a", "b"), ("MiXeD", "Id-9")] {
            let first = resolver.resolve_file_container(table, record, "f").unwrap();
            let second = resolver.resolve_file_container(table, record, "f").unwrap();
            assert_eq!(first, second);
            assert_eq!(first, first.to_lowercase());
        }
    }

    #[test]
    fn test_record_containers_match_file_container() {
        let resolver = DefaultContainerResolver::with_affixes("pre-", "");
        let containers = resolver.resolve_record_containers("Notes", "abc").unwrap();
        assert_eq!(containers.len(), 1);
        for file in ["x.png", "y.txt", "nested/z.bin"] {
            assert_eq!(
                containers[0],
                resolver.resolve_file_container("Notes", "abc", file).unwrap()
            );
        }
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let resolver = DefaultContainerResolver::new();
        assert!(matches!(
            resolver.resolve_file_container("", "abc", "f"),
            Err(StorageError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolver.resolve_record_containers("Notes", ""),
            Err(StorageError::InvalidArgument(_))
        ));
    }
}
