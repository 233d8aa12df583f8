use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::graph::entitlement::{EntitlementGrant, IdentityRef};
use crate::graph::errors::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    User,
    Group,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IdentityKind::User => "user",
            IdentityKind::Group => "group",
        })
    }
}

/// Value type for an advisory user-property declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Boolean,
    Number,
    String,
    Timestamp,
}

/// Advisory declarations of custom user-property names and types.
///
/// Declarations are metadata for the remote service only: `set_property`
/// accepts undeclared keys, and nothing validates values against the
/// declared type locally.
#[derive(Debug, Default)]
pub struct PropertyDefinitions {
    pub user_properties: IndexMap<String, PropertyType>,
}

impl PropertyDefinitions {
    /// Declare (or re-declare) a user property. Upsert; first declaration
    /// fixes the serialization position.
    pub fn define_user_property(&mut self, name: impl Into<String>, ty: PropertyType) {
        self.user_properties.insert(name.into(), ty);
    }
}

/// A user local to the modeled application.
#[derive(Debug)]
pub struct LocalUser {
    pub name: String,
    /// External identity aliases (e.g. emails). Appended verbatim; global
    /// uniqueness across users is the remote service's concern, not ours.
    pub identities: Vec<String>,
    pub properties: IndexMap<String, Value>,
    pub is_active: bool,
    /// Group memberships by group name. A back-reference: the group does
    /// not own its members.
    pub groups: Vec<String>,
    pub entitlements: Vec<EntitlementGrant>,
}

impl LocalUser {
    fn new(name: String) -> Self {
        Self {
            name,
            identities: Vec::new(),
            properties: IndexMap::new(),
            is_active: true,
            groups: Vec::new(),
            entitlements: Vec::new(),
        }
    }
}

/// A group local to the modeled application.
#[derive(Debug)]
pub struct LocalGroup {
    pub name: String,
    pub entitlements: Vec<EntitlementGrant>,
}

impl LocalGroup {
    fn new(name: String) -> Self {
        Self {
            name,
            entitlements: Vec::new(),
        }
    }
}

/// Users and groups of the application, each namespace keyed by name in
/// registration order.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    pub users: IndexMap<String, LocalUser>,
    pub groups: IndexMap<String, LocalGroup>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, name: impl Into<String>) -> Result<(), GraphError> {
        let name = name.into();
        if self.users.contains_key(&name) {
            return Err(GraphError::DuplicateIdentity {
                kind: IdentityKind::User,
                name,
            });
        }
        self.users.insert(name.clone(), LocalUser::new(name));
        Ok(())
    }

    pub fn add_group(&mut self, name: impl Into<String>) -> Result<(), GraphError> {
        let name = name.into();
        if self.groups.contains_key(&name) {
            return Err(GraphError::DuplicateIdentity {
                kind: IdentityKind::Group,
                name,
            });
        }
        self.groups.insert(name.clone(), LocalGroup::new(name));
        Ok(())
    }

    /// Append an external identity alias to a user.
    pub fn add_identity_alias(&mut self, user: &str, alias: &str) -> Result<(), GraphError> {
        self.user_mut(user)?.identities.push(alias.to_string());
        Ok(())
    }

    /// Upsert a custom attribute on a user. Keys are an open set.
    pub fn set_property(
        &mut self,
        user: &str,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), GraphError> {
        self.user_mut(user)?.properties.insert(key.into(), value);
        Ok(())
    }

    /// Record that `user` belongs to `group`. The group must be registered
    /// first; repeating an existing membership is a no-op.
    pub fn add_group_membership(&mut self, user: &str, group: &str) -> Result<(), GraphError> {
        if !self.groups.contains_key(group) {
            // touch the user first so a missing user reports as such
            self.user_mut(user)?;
            return Err(GraphError::UnknownGroup {
                name: group.to_string(),
            });
        }
        let user = self.user_mut(user)?;
        if !user.groups.iter().any(|g| g == group) {
            user.groups.push(group.to_string());
        }
        Ok(())
    }

    pub fn set_active(&mut self, user: &str, is_active: bool) -> Result<(), GraphError> {
        self.user_mut(user)?.is_active = is_active;
        Ok(())
    }

    pub fn user(&self, name: &str) -> Option<&LocalUser> {
        self.users.get(name)
    }

    pub fn group(&self, name: &str) -> Option<&LocalGroup> {
        self.groups.get(name)
    }

    fn user_mut(&mut self, name: &str) -> Result<&mut LocalUser, GraphError> {
        self.users
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownIdentity {
                identity: IdentityRef::user(name),
            })
    }
}
