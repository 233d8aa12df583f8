use std::collections::HashMap;

use crate::graph::errors::GraphError;

/// Handle into a [`ResourceTree`]. Only ever produced by the tree that owns
/// the node, so indexing through it cannot dangle within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

/// A named entity of the modeled application that access can be scoped to.
///
/// Parent and children are held as arena ids: the parent link is a weak
/// back-reference resolved from a name at insert time, never an owning
/// pointer, so the forest stays an ownership tree with no cycles.
#[derive(Debug)]
pub struct Resource {
    pub name: String,
    pub resource_type: String,
    pub description: Option<String>,
    pub parent: Option<ResourceId>,
    pub children: Vec<ResourceId>,
}

/// Forest of application resources, arbitrary depth.
///
/// Construction is single-pass and input-order-dependent: a child can only
/// be attached under a parent that was added earlier in the run. There is no
/// deferred resolution pass; the record producer is expected to emit rows
/// parent-first. Sibling names must be distinct, cross-branch reuse is
/// allowed, and the name index resolves reused names to the most recently
/// added holder.
#[derive(Debug, Default)]
pub struct ResourceTree {
    nodes: Vec<Resource>,
    roots: Vec<ResourceId>,
    by_name: HashMap<String, ResourceId>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level resource.
    pub fn add_root(
        &mut self,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        description: Option<&str>,
    ) -> Result<ResourceId, GraphError> {
        let name = name.into();
        if self.sibling_exists(&self.roots, &name) {
            return Err(GraphError::DuplicateResource {
                name,
                parent: "application".to_string(),
            });
        }
        let id = self.insert(name, resource_type.into(), description, None);
        self.roots.push(id);
        Ok(id)
    }

    /// Add a resource under `parent_name`. The parent must already have been
    /// added in this run; otherwise the row is rejected.
    pub fn add_child(
        &mut self,
        parent_name: &str,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        description: Option<&str>,
    ) -> Result<ResourceId, GraphError> {
        let name = name.into();
        let parent_id = match self.by_name.get(parent_name) {
            Some(id) => *id,
            None => {
                return Err(GraphError::UnresolvedParent {
                    name,
                    parent: parent_name.to_string(),
                })
            }
        };
        if self.sibling_exists(&self.nodes[parent_id.0].children, &name) {
            return Err(GraphError::DuplicateResource {
                name,
                parent: parent_name.to_string(),
            });
        }
        let id = self.insert(name, resource_type.into(), description, Some(parent_id));
        self.nodes[parent_id.0].children.push(id);
        Ok(id)
    }

    /// Resolve a resource name. With cross-branch name reuse this returns
    /// the most recently added resource carrying the name.
    pub fn lookup(&self, name: &str) -> Result<ResourceId, GraphError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownResource {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, id: ResourceId) -> &Resource {
        &self.nodes[id.0]
    }

    /// Top-level resources in insertion order.
    pub fn roots(&self) -> &[ResourceId] {
        &self.roots
    }

    /// Total node count across the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn sibling_exists(&self, siblings: &[ResourceId], name: &str) -> bool {
        siblings.iter().any(|id| self.nodes[id.0].name == name)
    }

    fn insert(
        &mut self,
        name: String,
        resource_type: String,
        description: Option<&str>,
        parent: Option<ResourceId>,
    ) -> ResourceId {
        let id = ResourceId(self.nodes.len());
        self.by_name.insert(name.clone(), id);
        self.nodes.push(Resource {
            name,
            resource_type,
            description: description.map(str::to_string),
            parent,
            children: Vec::new(),
        });
        id
    }
}
