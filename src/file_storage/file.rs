//! # File Records
//!
//! A file owned by a data-store record. `FileRecord::Absent` stands for "no
//! file" and has no fields to write into.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::backend::BlobItem;
use super::errors::{StorageError, StorageResult};

/// Details of a file that exists (or is being targeted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FileDetailsWire")]
pub struct FileDetails {
    id: String,
    name: String,
    table_name: String,
    parent_id: String,
    pub content_hash: Option<String>,
    pub length: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub store_uri: String,
    pub metadata: HashMap<String, String>,
}

impl FileDetails {
    /// File identified by table, owning record and name; the name doubles as id
    pub fn target(
        table_name: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> StorageResult<Self> {
        let name = name.into();
        Self::new(name.clone(), name, table_name.into(), parent_id.into())
    }

    fn new(id: String, name: String, table_name: String, parent_id: String) -> StorageResult<Self> {
        for (field, value) in [
            ("id", &id),
            ("name", &name),
            ("tableName", &table_name),
            ("parentId", &parent_id),
        ] {
            if value.is_empty() {
                return Err(StorageError::invalid_argument(field));
            }
        }
        for (field, value) in [("id", &id), ("name", &name)] {
            if has_dot_segment(value) {
                return Err(StorageError::InvalidArgument(format!(
                    "'{}' may not contain '.' or '..' path segments",
                    field
                )));
            }
        }

        Ok(Self {
            id,
            name,
            table_name,
            parent_id,
            content_hash: None,
            length: 0,
            last_modified: None,
            store_uri: String::new(),
            metadata: HashMap::new(),
        })
    }

    /// Build from a backend listing entry
    pub fn from_blob_item(
        item: BlobItem,
        table_name: &str,
        parent_id: &str,
        store_uri: String,
    ) -> StorageResult<Self> {
        let mut details = Self::new(
            item.name.clone(),
            item.name,
            table_name.to_string(),
            parent_id.to_string(),
        )?;
        details.content_hash = item.content_hash;
        details.length = item.length;
        details.last_modified = item.last_modified;
        details.store_uri = store_uri;
        details.metadata = item.metadata;
        Ok(details)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// JSON snapshot of these details, handed to clients as an opaque value
    pub fn file_info_token(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Populate descriptive fields from a file info token.
    ///
    /// Empty or malformed input is ignored. Fields that would break the
    /// identity invariant (empty id, name, table or parent) are skipped.
    pub fn apply_file_info_token(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        let Ok(wire) = serde_json::from_str::<FileDetailsWire>(token) else {
            return;
        };

        let keep_non_empty = |target: &mut String, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                *target = value;
            }
        };
        let keep_object_name = |target: &mut String, value: Option<String>| {
            keep_non_empty(target, value.filter(|v| !has_dot_segment(v)));
        };
        keep_object_name(&mut self.id, wire.id);
        keep_object_name(&mut self.name, wire.name);
        keep_non_empty(&mut self.table_name, wire.table_name);
        keep_non_empty(&mut self.parent_id, wire.parent_id);

        if wire.content_hash.is_some() {
            self.content_hash = wire.content_hash;
        }
        if let Some(length) = wire.length {
            self.length = length;
        }
        if wire.last_modified.is_some() {
            self.last_modified = wire.last_modified;
        }
        if let Some(store_uri) = wire.store_uri {
            self.store_uri = store_uri;
        }
        if let Some(metadata) = wire.metadata {
            self.metadata = metadata;
        }
    }
}

/// Object names are joined into URIs segment by segment, where `.` and `..`
/// would be collapsed away from the signed resource
fn has_dot_segment(name: &str) -> bool {
    name.split('/').any(|segment| segment == "." || segment == "..")
}

/// Lenient JSON form; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FileDetailsWire {
    id: Option<String>,
    name: Option<String>,
    table_name: Option<String>,
    parent_id: Option<String>,
    content_hash: Option<String>,
    length: Option<u64>,
    last_modified: Option<DateTime<Utc>>,
    store_uri: Option<String>,
    metadata: Option<HashMap<String, String>>,
}

impl TryFrom<FileDetailsWire> for FileDetails {
    type Error = StorageError;

    fn try_from(wire: FileDetailsWire) -> Result<Self, Self::Error> {
        let name = wire.name.unwrap_or_default();
        let id = wire.id.filter(|id| !id.is_empty()).unwrap_or_else(|| name.clone());
        let mut details = Self::new(
            id,
            name,
            wire.table_name.unwrap_or_default(),
            wire.parent_id.unwrap_or_default(),
        )?;
        details.content_hash = wire.content_hash;
        details.length = wire.length.unwrap_or_default();
        details.last_modified = wire.last_modified;
        details.store_uri = wire.store_uri.unwrap_or_default();
        details.metadata = wire.metadata.unwrap_or_default();
        Ok(details)
    }
}

/// A file owned by a record, or the absence of one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileRecord {
    Present(FileDetails),
    #[default]
    Absent,
}

impl FileRecord {
    pub fn details(&self) -> Option<&FileDetails> {
        match self {
            FileRecord::Present(details) => Some(details),
            FileRecord::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FileRecord::Absent)
    }

    pub fn id(&self) -> Option<&str> {
        self.details().map(FileDetails::id)
    }

    pub fn name(&self) -> Option<&str> {
        self.details().map(FileDetails::name)
    }

    pub fn table_name(&self) -> Option<&str> {
        self.details().map(FileDetails::table_name)
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.details().map(FileDetails::parent_id)
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.details().and_then(|d| d.content_hash.as_deref())
    }

    pub fn length(&self) -> u64 {
        self.details().map(|d| d.length).unwrap_or_default()
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.details().and_then(|d| d.last_modified)
    }

    pub fn store_uri(&self) -> Option<&str> {
        self.details().map(|d| d.store_uri.as_str())
    }

    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        self.details().map(|d| &d.metadata)
    }

    pub fn file_info_token(&self) -> Option<String> {
        self.details().map(FileDetails::file_info_token)
    }
}

impl From<FileDetails> for FileRecord {
    fn from(details: FileDetails) -> Self {
        FileRecord::Present(details)
    }
}

impl Serialize for FileRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FileRecord::Present(details) => details.serialize(serializer),
            FileRecord::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FileRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<FileDetails>::deserialize(deserializer)?
            .map(FileRecord::Present)
            .unwrap_or(FileRecord::Absent))
    }
}
