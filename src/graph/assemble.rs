use std::collections::HashSet;
use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::document::{
    GraphDocument, GrantEntry, GroupEntry, PermissionEntry, PropertyDefinitionsEntry,
    ResourceEntry, UserEntry,
};
use crate::graph::entitlement::{EntitlementGrant, GrantScope};
use crate::graph::identity::IdentityKind;
use crate::graph::resource::{ResourceId, ResourceTree};
use crate::graph::Application;

/// One violation that makes the graph unpublishable.
///
/// The build stage already rejects these through [`Application::grant`] and
/// friends, but registries expose their maps for bulk construction, so the
/// assembler re-checks everything and reports the full list in one shot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyIssue {
    #[error("permission `{permission}` is registered under key `{key}`")]
    PermissionKeyMismatch { key: String, permission: String },

    #[error("{kind} `{identity}` is registered under key `{key}`")]
    IdentityKeyMismatch {
        kind: IdentityKind,
        key: String,
        identity: String,
    },

    #[error("{kind} `{identity}` holds a grant for unknown permission `{permission}`")]
    DanglingPermission {
        kind: IdentityKind,
        identity: String,
        permission: String,
    },

    #[error("grant `{permission}` on {kind} `{identity}` names unknown resource `{resource}`")]
    DanglingResource {
        kind: IdentityKind,
        identity: String,
        permission: String,
        resource: String,
    },

    #[error("grant `{permission}` on {kind} `{identity}` has an empty resource scope")]
    EmptyScope {
        kind: IdentityKind,
        identity: String,
        permission: String,
    },

    #[error("user `{user}` is a member of unknown group `{group}`")]
    DanglingMembership { user: String, group: String },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{}", list_issues(.issues))]
#[diagnostic(
    code(orrery::graph::assembly),
    help("fix the offending rows and rerun")
)]
pub struct AssemblyError {
    pub issues: Vec<AssemblyIssue>,
}

/// The full issue list goes into the message so a single failed run names
/// every offending identifier, not just a count.
fn list_issues(issues: &[AssemblyIssue]) -> String {
    let mut message = format!(
        "authorization graph is not publishable ({} issue(s))",
        issues.len()
    );
    for issue in issues {
        message.push_str("\n  ");
        message.push_str(&issue.to_string());
    }
    message
}

/// Suspicious but publishable conditions, surfaced for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyWarning {
    /// A user with no entitlements and no group memberships grants nothing.
    InertUser { name: String },
    /// A group with no entitlements and no members grants nothing.
    InertGroup { name: String },
}

impl fmt::Display for AssemblyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyWarning::InertUser { name } => {
                write!(f, "user `{name}` has no entitlements and no group memberships")
            }
            AssemblyWarning::InertGroup { name } => {
                write!(f, "group `{name}` has no entitlements and no members")
            }
        }
    }
}

#[derive(Debug)]
pub struct AssembledGraph {
    pub document: GraphDocument,
    pub warnings: Vec<AssemblyWarning>,
}

/// Validate the whole graph and render its canonical document.
///
/// Validation is exhaustive: every dangling reference and namespace
/// inconsistency across the entire graph is collected before the function
/// returns, so a single run reports everything wrong with the input. Only a
/// fully consistent graph produces a document.
pub fn assemble(app: &Application) -> Result<AssembledGraph, AssemblyError> {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    for (key, permission) in &app.permissions.permissions {
        if *key != permission.name {
            issues.push(AssemblyIssue::PermissionKeyMismatch {
                key: key.clone(),
                permission: permission.name.clone(),
            });
        }
    }

    let mut populated_groups: HashSet<&str> = HashSet::new();
    for user in app.identities.users.values() {
        for group in &user.groups {
            populated_groups.insert(group.as_str());
        }
    }

    for (key, user) in &app.identities.users {
        if *key != user.name {
            issues.push(AssemblyIssue::IdentityKeyMismatch {
                kind: IdentityKind::User,
                key: key.clone(),
                identity: user.name.clone(),
            });
        }
        for group in &user.groups {
            if app.identities.group(group).is_none() {
                issues.push(AssemblyIssue::DanglingMembership {
                    user: user.name.clone(),
                    group: group.clone(),
                });
            }
        }
        check_grants(
            IdentityKind::User,
            &user.name,
            &user.entitlements,
            app,
            &mut issues,
        );
        if user.entitlements.is_empty() && user.groups.is_empty() {
            warnings.push(AssemblyWarning::InertUser {
                name: user.name.clone(),
            });
        }
    }

    for (key, group) in &app.identities.groups {
        if *key != group.name {
            issues.push(AssemblyIssue::IdentityKeyMismatch {
                kind: IdentityKind::Group,
                key: key.clone(),
                identity: group.name.clone(),
            });
        }
        check_grants(
            IdentityKind::Group,
            &group.name,
            &group.entitlements,
            app,
            &mut issues,
        );
        if group.entitlements.is_empty() && !populated_groups.contains(key.as_str()) {
            warnings.push(AssemblyWarning::InertGroup {
                name: group.name.clone(),
            });
        }
    }

    if !issues.is_empty() {
        return Err(AssemblyError { issues });
    }

    let document = build_document(app);
    tracing::info!(
        permissions = app.permissions.len(),
        resources = app.resources.len(),
        users = app.identities.users.len(),
        groups = app.identities.groups.len(),
        warnings = warnings.len(),
        "assembled authorization graph"
    );
    Ok(AssembledGraph { document, warnings })
}

fn check_grants(
    kind: IdentityKind,
    identity: &str,
    grants: &[EntitlementGrant],
    app: &Application,
    issues: &mut Vec<AssemblyIssue>,
) {
    for grant in grants {
        if !app.permissions.contains(&grant.permission) {
            issues.push(AssemblyIssue::DanglingPermission {
                kind,
                identity: identity.to_string(),
                permission: grant.permission.clone(),
            });
        }
        match &grant.scope {
            GrantScope::Application => {}
            GrantScope::Resources(names) if names.is_empty() => {
                issues.push(AssemblyIssue::EmptyScope {
                    kind,
                    identity: identity.to_string(),
                    permission: grant.permission.clone(),
                });
            }
            GrantScope::Resources(names) => {
                for name in names {
                    if !app.resources.contains(name) {
                        issues.push(AssemblyIssue::DanglingResource {
                            kind,
                            identity: identity.to_string(),
                            permission: grant.permission.clone(),
                            resource: name.clone(),
                        });
                    }
                }
            }
        }
    }
}

fn build_document(app: &Application) -> GraphDocument {
    GraphDocument {
        name: app.name.clone(),
        application_type: app.application_type.clone(),
        description: app.description.clone(),
        property_definitions: PropertyDefinitionsEntry {
            local_user_properties: app.property_definitions.user_properties.clone(),
        },
        custom_permissions: app
            .permissions
            .permissions
            .values()
            .map(|permission| PermissionEntry {
                name: permission.name.clone(),
                access_levels: permission.access_levels.clone(),
            })
            .collect(),
        resources: app
            .resources
            .roots()
            .iter()
            .map(|id| resource_entry(&app.resources, *id))
            .collect(),
        local_users: app
            .identities
            .users
            .values()
            .map(|user| UserEntry {
                name: user.name.clone(),
                identities: user.identities.clone(),
                custom_properties: user.properties.clone(),
                is_active: user.is_active,
                groups: user.groups.clone(),
                entitlements: user.entitlements.iter().map(GrantEntry::from).collect(),
            })
            .collect(),
        local_groups: app
            .identities
            .groups
            .values()
            .map(|group| GroupEntry {
                name: group.name.clone(),
                entitlements: group.entitlements.iter().map(GrantEntry::from).collect(),
            })
            .collect(),
    }
}

fn resource_entry(tree: &ResourceTree, id: ResourceId) -> ResourceEntry {
    let node = tree.get(id);
    ResourceEntry {
        name: node.name.clone(),
        resource_type: node.resource_type.clone(),
        description: node.description.clone(),
        sub_resources: node
            .children
            .iter()
            .map(|child| resource_entry(tree, *child))
            .collect(),
    }
}
