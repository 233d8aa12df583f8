use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::errors::GraphError;

/// Canonical effective-access levels a named permission maps onto.
///
/// Every application-native permission is bound to one or more of these so
/// the remote service can reason about effective access uniformly across
/// applications. The token names are part of the input contract: the
/// `permissions` column carries them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    DataRead,
    DataWrite,
    DataCreate,
    DataDelete,
    MetadataRead,
    MetadataWrite,
    MetadataCreate,
    MetadataDelete,
    NonData,
    Uncategorized,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::DataRead => "DataRead",
            AccessLevel::DataWrite => "DataWrite",
            AccessLevel::DataCreate => "DataCreate",
            AccessLevel::DataDelete => "DataDelete",
            AccessLevel::MetadataRead => "MetadataRead",
            AccessLevel::MetadataWrite => "MetadataWrite",
            AccessLevel::MetadataCreate => "MetadataCreate",
            AccessLevel::MetadataDelete => "MetadataDelete",
            AccessLevel::NonData => "NonData",
            AccessLevel::Uncategorized => "Uncategorized",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = GraphError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DataRead" => Ok(AccessLevel::DataRead),
            "DataWrite" => Ok(AccessLevel::DataWrite),
            "DataCreate" => Ok(AccessLevel::DataCreate),
            "DataDelete" => Ok(AccessLevel::DataDelete),
            "MetadataRead" => Ok(AccessLevel::MetadataRead),
            "MetadataWrite" => Ok(AccessLevel::MetadataWrite),
            "MetadataCreate" => Ok(AccessLevel::MetadataCreate),
            "MetadataDelete" => Ok(AccessLevel::MetadataDelete),
            "NonData" => Ok(AccessLevel::NonData),
            "Uncategorized" => Ok(AccessLevel::Uncategorized),
            other => Err(GraphError::InvalidAccessLevel {
                token: other.to_string(),
            }),
        }
    }
}

/// A named application permission bound to its canonical access levels.
#[derive(Debug, Clone)]
pub struct CustomPermission {
    pub name: String,
    pub access_levels: Vec<AccessLevel>,
}

/// Registry of the application's named permissions.
///
/// Permissions must be registered before any entitlement references them and
/// are immutable for the rest of the run. Registration order is preserved so
/// serialization stays deterministic and diff-friendly.
#[derive(Debug, Default)]
pub struct PermissionRegistry {
    pub permissions: IndexMap<String, CustomPermission>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a permission. Fails if `name` is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        access_levels: Vec<AccessLevel>,
    ) -> Result<(), GraphError> {
        let name = name.into();
        if self.permissions.contains_key(&name) {
            return Err(GraphError::DuplicatePermission { name });
        }
        self.permissions.insert(
            name.clone(),
            CustomPermission {
                name,
                access_levels,
            },
        );
        Ok(())
    }

    /// Look up a registered permission by name.
    pub fn resolve(&self, name: &str) -> Result<&CustomPermission, GraphError> {
        self.permissions
            .get(name)
            .ok_or_else(|| GraphError::UnknownPermission {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.permissions.contains_key(name)
    }

    /// Permissions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CustomPermission> {
        self.permissions.values()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}
