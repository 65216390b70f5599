//! # Storage Permissions
//!
//! Abstract permission vocabulary requested by clients, and its translation
//! into the blob backend's native shared-access permissions.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{StorageError, StorageResult};

/// Requested permission bit set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permissions(u8);

impl Permissions {
    pub const NONE: Permissions = Permissions(0x0);
    pub const READ: Permissions = Permissions(0x1);
    pub const WRITE: Permissions = Permissions(0x2);
    pub const DELETE: Permissions = Permissions(0x4);
    pub const LIST: Permissions = Permissions(0x8);
    pub const READ_WRITE: Permissions = Permissions(0x1 | 0x2);
    pub const ALL: Permissions = Permissions(0x1 | 0x2 | 0x4 | 0x8);

    const NAMES: [(&'static str, Permissions); 7] = [
        ("none", Permissions::NONE),
        ("read", Permissions::READ),
        ("write", Permissions::WRITE),
        ("delete", Permissions::DELETE),
        ("list", Permissions::LIST),
        ("readwrite", Permissions::READ_WRITE),
        ("all", Permissions::ALL),
    ];

    /// Build from raw bits, rejecting unknown bits
    pub fn from_bits(bits: u8) -> StorageResult<Self> {
        if bits & !Self::ALL.0 != 0 {
            return Err(StorageError::InvalidArgument(format!(
                "unknown permission bits: {:#x}",
                bits
            )));
        }
        Ok(Permissions(bits))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set
    pub fn contains(&self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Parse `"Read, Write"` style lists (case-insensitive)
    pub fn parse_names(s: &str) -> StorageResult<Self> {
        let mut permissions = Permissions::NONE;
        for part in s.split(|c: char| c == ',' || c == '|') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let lower = part.to_ascii_lowercase();
            let (_, value) = Self::NAMES
                .iter()
                .find(|(name, _)| *name == lower)
                .ok_or_else(|| {
                    StorageError::InvalidArgument(format!("unknown permission: {}", part))
                })?;
            permissions |= *value;
        }
        Ok(permissions)
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Permissions;

    fn bitand(self, rhs: Self) -> Self::Output {
        Permissions(self.0 & rhs.0)
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PermissionsVisitor;

        impl<'de> Visitor<'de> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a permission bit set or a comma-separated list of permission names")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Permissions, E> {
                let bits = u8::try_from(v).map_err(|_| E::custom("permission bits out of range"))?;
                Permissions::from_bits(bits).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Permissions, E> {
                let bits = u64::try_from(v).map_err(|_| E::custom("negative permission bits"))?;
                self.visit_u64(bits)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Permissions, E> {
                Permissions::parse_names(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

/// Whether a token covers one file or a whole record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenScope {
    #[default]
    Record,
    File,
}

impl TokenScope {
    /// Blob service `sr` value for this scope
    pub fn signed_resource(&self) -> &'static str {
        match self {
            TokenScope::Record => "c",
            TokenScope::File => "b",
        }
    }
}

/// Native blob shared-access permissions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobSasPermissions {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
}

/// Backend permission granted for each abstract bit.
///
/// `LIST` has no entry: listing goes through this service, never through a
/// signed token, so it is dropped from the grant.
const PERMISSION_MAPPING: [(Permissions, BlobSasPermission); 3] = [
    (Permissions::READ, BlobSasPermission::Read),
    (Permissions::WRITE, BlobSasPermission::Write),
    (Permissions::DELETE, BlobSasPermission::Delete),
];

#[derive(Debug, Clone, Copy)]
enum BlobSasPermission {
    Read,
    Write,
    Delete,
}

impl BlobSasPermissions {
    /// Translate abstract permissions through the fixed mapping table
    pub fn from_permissions(permissions: Permissions) -> Self {
        PERMISSION_MAPPING
            .iter()
            .filter(|(abstract_bit, _)| permissions.contains(*abstract_bit))
            .fold(Self::default(), |mut acc, (_, native)| {
                match native {
                    BlobSasPermission::Read => acc.read = true,
                    BlobSasPermission::Write => acc.write = true,
                    BlobSasPermission::Delete => acc.delete = true,
                }
                acc
            })
    }

    /// Canonical `sp` string ("rwd" ordering)
    pub fn to_sas_string(&self) -> String {
        let mut s = String::with_capacity(3);
        if self.read {
            s.push('r');
        }
        if self.write {
            s.push('w');
        }
        if self.delete {
            s.push('d');
        }
        s
    }

    pub fn parse(sp: &str) -> StorageResult<Self> {
        let mut permissions = Self::default();
        for c in sp.chars() {
            match c {
                'r' => permissions.read = true,
                'w' => permissions.write = true,
                'd' => permissions.delete = true,
                other => {
                    return Err(StorageError::InvalidToken(format!(
                        "unsupported permission '{}'",
                        other
                    )))
                }
            }
        }
        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations() {
        assert_eq!(Permissions::READ | Permissions::WRITE, Permissions::READ_WRITE);
        assert_eq!(Permissions::ALL.bits(), 0xF);
        assert!(Permissions::ALL.contains(Permissions::DELETE));
        assert!(!Permissions::READ_WRITE.contains(Permissions::LIST));
        assert!(Permissions::NONE.is_empty());
    }

    #[test]
    fn test_unknown_bits_rejected() {
        assert!(Permissions::from_bits(0x10).is_err());
        assert_eq!(Permissions::from_bits(0x5).unwrap(), Permissions::READ | Permissions::DELETE);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Permissions::parse_names("Read, Write").unwrap(), Permissions::READ_WRITE);
        assert_eq!(Permissions::parse_names("all").unwrap(), Permissions::ALL);
        assert_eq!(Permissions::parse_names("").unwrap(), Permissions::NONE);
        assert!(Permissions::parse_names("read, execute").is_err());
    }

    #[test]
    fn test_json_forms() {
        let from_number: Permissions = serde_json::from_str("3").unwrap();
        let from_names: Permissions = serde_json::from_str("\"Read, Write\"").unwrap();
        assert_eq!(from_number, Permissions::READ_WRITE);
        assert_eq!(from_names, Permissions::READ_WRITE);
        assert_eq!(serde_json::to_string(&Permissions::ALL).unwrap(), "15");
        assert!(serde_json::from_str::<Permissions>("300").is_err());
    }

    #[test]
    fn test_translation_table() {
        let native = BlobSasPermissions::from_permissions(Permissions::READ_WRITE);
        assert_eq!(native.to_sas_string(), "rw");

        let native = BlobSasPermissions::from_permissions(Permissions::DELETE | Permissions::READ);
        assert_eq!(native.to_sas_string(), "rd");
    }

    #[test]
    fn test_list_is_dropped() {
        let native = BlobSasPermissions::from_permissions(Permissions::LIST);
        assert_eq!(native, BlobSasPermissions::default());
        assert_eq!(BlobSasPermissions::from_permissions(Permissions::ALL).to_sas_string(), "rwd");
    }

    #[test]
    fn test_sas_string_parse() {
        let parsed = BlobSasPermissions::parse("rd").unwrap();
        assert!(parsed.read && parsed.delete && !parsed.write);
        assert!(BlobSasPermissions::parse("rl").is_err());
    }

    #[test]
    fn test_scope_resource() {
        assert_eq!(TokenScope::Record.signed_resource(), "c");
        assert_eq!(TokenScope::File.signed_resource(), "b");
        assert_eq!(serde_json::to_string(&TokenScope::File).unwrap(), "\"File\"");
    }
}
