pub mod assemble;
pub mod document;
pub mod entitlement;
pub mod errors;
pub mod identity;
pub mod permission;
pub mod resource;

pub use assemble::{assemble, AssembledGraph, AssemblyError, AssemblyIssue, AssemblyWarning};
pub use document::GraphDocument;
pub use entitlement::{EntitlementGrant, GrantScope, IdentityRef};
pub use errors::GraphError;
pub use identity::{IdentityKind, IdentityRegistry, PropertyDefinitions, PropertyType};
pub use permission::{AccessLevel, PermissionRegistry};
pub use resource::{ResourceId, ResourceTree};

/// Root aggregate for one modeled application.
///
/// Owns the permission registry, the resource forest, and the identity
/// registry. Built fresh for every run from ordered input records, read-only
/// once assembly starts, and discarded after serialization; there is no
/// cross-run state.
#[derive(Debug)]
pub struct Application {
    pub name: String,
    pub application_type: String,
    pub description: Option<String>,
    pub permissions: PermissionRegistry,
    pub resources: ResourceTree,
    pub identities: IdentityRegistry,
    pub property_definitions: PropertyDefinitions,
}

impl Application {
    pub fn new(name: impl Into<String>, application_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_type: application_type.into(),
            description: None,
            permissions: PermissionRegistry::new(),
            resources: ResourceTree::new(),
            identities: IdentityRegistry::new(),
            property_definitions: PropertyDefinitions::default(),
        }
    }

    /// Bind `permission` to `identity` over `scope`.
    ///
    /// Every reference is validated before anything is mutated: a rejected
    /// grant leaves the identity's grant list exactly as it was. Duplicate
    /// grants are legal and appended verbatim. The permission registry and
    /// resource tree are never touched.
    pub fn grant(
        &mut self,
        identity: &IdentityRef,
        permission: &str,
        scope: GrantScope,
    ) -> Result<(), GraphError> {
        let grants = match identity {
            IdentityRef::User(name) => self
                .identities
                .users
                .get_mut(name)
                .map(|user| &mut user.entitlements),
            IdentityRef::Group(name) => self
                .identities
                .groups
                .get_mut(name)
                .map(|group| &mut group.entitlements),
        }
        .ok_or_else(|| GraphError::UnknownIdentity {
            identity: identity.clone(),
        })?;

        self.permissions.resolve(permission)?;

        if let GrantScope::Resources(names) = &scope {
            if names.is_empty() {
                return Err(GraphError::EmptyResourceScope {
                    identity: identity.clone(),
                    permission: permission.to_string(),
                });
            }
            for name in names {
                self.resources.lookup(name)?;
            }
        }

        grants.push(EntitlementGrant {
            permission: permission.to_string(),
            scope,
        });
        Ok(())
    }
}
