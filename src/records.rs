//! Normalized input-row types for the five ingest tables.
//!
//! Optional columns deserialize as plain strings with the empty string
//! meaning "absent", which is how the upstream exports encode missing
//! values. Multi-valued cells use `;` as the separator.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::graph::{AccessLevel, GraphError, IdentityRef};

/// Row of `permissions.csv`.
#[derive(Debug, Deserialize)]
pub struct PermissionRow {
    pub name: String,
    /// `;`-separated canonical access-level tokens.
    pub permissions: String,
}

/// Row of `resources.csv`. Rows must arrive parent-first; `parent_name`
/// empty marks a top-level resource.
#[derive(Debug, Deserialize)]
pub struct ResourceRow {
    pub name: String,
    pub resource_type: String,
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub description: String,
}

/// Row of `users.csv`. Columns beyond the reserved ones are captured as
/// custom properties, keyed by header.
#[derive(Debug, Deserialize)]
pub struct UserRow {
    pub name: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub groups: String,
    #[serde(default)]
    pub is_active: String,
    #[serde(flatten)]
    pub properties: IndexMap<String, String>,
}

/// Row of `groups.csv`.
#[derive(Debug, Deserialize)]
pub struct GroupRow {
    pub name: String,
}

/// Row of `identity_to_permissions.csv`. An empty `resource_name` means
/// the grant applies to the whole application.
#[derive(Debug, Deserialize)]
pub struct EntitlementRow {
    pub identity: String,
    pub identity_type: String,
    pub permission: String,
    #[serde(default)]
    pub resource_name: String,
}

impl EntitlementRow {
    /// Resolve the `identity_type` discriminator into a typed reference.
    /// Returns the unrecognized token on failure so the caller can report it.
    pub fn identity_ref(&self) -> Result<IdentityRef, String> {
        match self.identity_type.as_str() {
            "local_user" => Ok(IdentityRef::user(&self.identity)),
            "local_group" => Ok(IdentityRef::group(&self.identity)),
            other => Err(other.to_string()),
        }
    }
}

/// Split a `;`-separated cell, trimming entries and dropping empties.
pub fn split_multi(field: &str) -> Vec<&str> {
    field
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Parse a `;`-separated list of canonical access-level tokens.
pub fn parse_access_levels(field: &str) -> Result<Vec<AccessLevel>, GraphError> {
    split_multi(field)
        .into_iter()
        .map(str::parse)
        .collect()
}

/// Parse a boolean-like cell. Accepts true/false/yes/no/1/0 in any case;
/// anything else is `None` and callers treat it as a bad row.
pub fn parse_bool_token(field: &str) -> Option<bool> {
    match field.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Headers of `users.csv` that never become custom properties.
pub const RESERVED_USER_COLUMNS: &[&str] = &["name", "identity", "groups", "is_active"];

impl UserRow {
    /// Custom-property cells: every non-reserved, non-empty column.
    pub fn custom_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .filter(|(key, value)| {
                !RESERVED_USER_COLUMNS.contains(&key.as_str()) && !value.is_empty()
            })
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl ResourceRow {
    pub fn parent(&self) -> Option<&str> {
        if self.parent_name.is_empty() {
            None
        } else {
            Some(&self.parent_name)
        }
    }

    pub fn description(&self) -> Option<&str> {
        if self.description.is_empty() {
            None
        } else {
            Some(&self.description)
        }
    }
}
