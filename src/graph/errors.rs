use miette::Diagnostic;
use thiserror::Error;

use crate::graph::entitlement::IdentityRef;
use crate::graph::identity::IdentityKind;

/// Construction errors raised while building the authorization graph.
///
/// Every variant names the offending record so callers can report a precise
/// message. Construction errors are always fatal to the current build: the
/// input is malformed and must be corrected upstream. A failed call never
/// leaves partially-applied state for the entity it rejected.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("permission `{name}` is already registered")]
    #[diagnostic(
        code(orrery::graph::duplicate_permission),
        help("permission names must be unique; remove the duplicate row from permissions.csv")
    )]
    DuplicatePermission { name: String },

    #[error("`{token}` is not a canonical access level")]
    #[diagnostic(
        code(orrery::graph::invalid_access_level),
        help("valid tokens: DataRead, DataWrite, DataCreate, DataDelete, MetadataRead, MetadataWrite, MetadataCreate, MetadataDelete, NonData, Uncategorized")
    )]
    InvalidAccessLevel { token: String },

    #[error("resource `{name}` already exists under `{parent}`")]
    #[diagnostic(
        code(orrery::graph::duplicate_resource),
        help("sibling resources must have distinct names; reuse across branches is fine")
    )]
    DuplicateResource { name: String, parent: String },

    #[error("parent resource `{parent}` not found for `{name}`")]
    #[diagnostic(
        code(orrery::graph::unresolved_parent),
        help("rows are resolved in input order; a parent must appear before any of its children")
    )]
    UnresolvedParent { name: String, parent: String },

    #[error("{kind} `{name}` is already registered")]
    #[diagnostic(
        code(orrery::graph::duplicate_identity),
        help("user and group names must each be unique within the application")
    )]
    DuplicateIdentity { kind: IdentityKind, name: String },

    #[error("group `{name}` not found")]
    #[diagnostic(
        code(orrery::graph::unknown_group),
        help("register the group before assigning members to it")
    )]
    UnknownGroup { name: String },

    #[error("{identity} not found")]
    #[diagnostic(
        code(orrery::graph::unknown_identity),
        help("grants can only target a previously registered user or group")
    )]
    UnknownIdentity { identity: IdentityRef },

    #[error("permission `{name}` not found")]
    #[diagnostic(
        code(orrery::graph::unknown_permission),
        help("permissions must be registered before any grant references them")
    )]
    UnknownPermission { name: String },

    #[error("resource `{name}` not found")]
    #[diagnostic(
        code(orrery::graph::unknown_resource),
        help("grant scopes may only reference resources present in the resource tree")
    )]
    UnknownResource { name: String },

    #[error("grant of `{permission}` to {identity} has an empty resource scope")]
    #[diagnostic(
        code(orrery::graph::empty_resource_scope),
        help("scope a grant to at least one resource, or mark it application-wide")
    )]
    EmptyResourceScope {
        identity: IdentityRef,
        permission: String,
    },
}
