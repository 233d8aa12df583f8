use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::graph::entitlement::{EntitlementGrant, GrantScope};
use crate::graph::identity::PropertyType;
use crate::graph::permission::AccessLevel;

/// Canonical serialized form of one application's authorization graph.
///
/// This is the document handed to the publisher. Every list and map follows
/// registration order, never name order, so two runs over identical input
/// serialize byte-identically and diffs stay readable.
#[derive(Debug, Serialize)]
pub struct GraphDocument {
    pub name: String,
    pub application_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub property_definitions: PropertyDefinitionsEntry,
    pub custom_permissions: Vec<PermissionEntry>,
    pub resources: Vec<ResourceEntry>,
    pub local_users: Vec<UserEntry>,
    pub local_groups: Vec<GroupEntry>,
}

impl GraphDocument {
    /// Canonical compact serialization, the exact bytes the publisher sends.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Human-readable serialization for payload dumps.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Serialize)]
pub struct PropertyDefinitionsEntry {
    pub local_user_properties: IndexMap<String, PropertyType>,
}

#[derive(Debug, Serialize)]
pub struct PermissionEntry {
    pub name: String,
    pub access_levels: Vec<AccessLevel>,
}

/// One node of the resource forest; children are carried inline.
#[derive(Debug, Serialize)]
pub struct ResourceEntry {
    pub name: String,
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_resources: Vec<ResourceEntry>,
}

#[derive(Debug, Serialize)]
pub struct UserEntry {
    pub name: String,
    pub identities: Vec<String>,
    pub custom_properties: IndexMap<String, Value>,
    pub is_active: bool,
    pub groups: Vec<String>,
    pub entitlements: Vec<GrantEntry>,
}

#[derive(Debug, Serialize)]
pub struct GroupEntry {
    pub name: String,
    pub entitlements: Vec<GrantEntry>,
}

/// Wire form of a grant: either scoped to named resources or flagged
/// application-wide, never both.
#[derive(Debug, Serialize)]
pub struct GrantEntry {
    pub permission: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_to_application: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl From<&EntitlementGrant> for GrantEntry {
    fn from(grant: &EntitlementGrant) -> Self {
        match &grant.scope {
            GrantScope::Application => GrantEntry {
                permission: grant.permission.clone(),
                apply_to_application: Some(true),
                resources: None,
            },
            GrantScope::Resources(names) => GrantEntry {
                permission: grant.permission.clone(),
                apply_to_application: None,
                resources: Some(names.clone()),
            },
        }
    }
}
