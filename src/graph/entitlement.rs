use crate::graph::identity::IdentityKind;

/// Names the registered user or group a grant targets. Users and groups are
/// the only identity kinds in this domain, so a closed enum rather than an
/// open trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRef {
    User(String),
    Group(String),
}

impl IdentityRef {
    pub fn user(name: impl Into<String>) -> Self {
        IdentityRef::User(name.into())
    }

    pub fn group(name: impl Into<String>) -> Self {
        IdentityRef::Group(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            IdentityRef::User(name) | IdentityRef::Group(name) => name,
        }
    }

    pub fn kind(&self) -> IdentityKind {
        match self {
            IdentityRef::User(_) => IdentityKind::User,
            IdentityRef::Group(_) => IdentityKind::Group,
        }
    }
}

impl std::fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} `{}`", self.kind(), self.name())
    }
}

/// What an entitlement grant covers: the whole application, or a set of
/// named resources. Resource references are lookup keys into the resource
/// tree, validated when the grant is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantScope {
    Application,
    Resources(Vec<String>),
}

impl GrantScope {
    pub fn resources(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        GrantScope::Resources(names.into_iter().map(Into::into).collect())
    }
}

/// One permission granted to one identity. Duplicate grants on the same
/// identity are legal and preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementGrant {
    pub permission: String,
    pub scope: GrantScope,
}
