//! Declared resources and their dependency sets.
//!
//! A [`ResourceNode`] is the record of one declared remote resource: its
//! logical identity, kind, a non-owning back reference to its parent, the
//! (post-transform) draft it was declared with, and the full dependency set
//! computed at declaration time. Nodes are immutable once constructed;
//! declaration is the single side-effecting act, and teardown happens only
//! through the owning scope.

use core::fmt;
use std::sync::Arc;

use cirrus_value::{DepSet, SourceId};

use crate::draft::Draft;

/// The kind of remote resource a node declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A compute function (the subscriber's handler).
    Function,
    /// An event-routing rule matching a topic filter.
    TopicRule,
    /// An invocation permission from the rule to the function.
    Permission,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Function => "function",
            ResourceKind::TopicRule => "topic_rule",
            ResourceKind::Permission => "permission",
        };
        write!(f, "{name}")
    }
}

/// Logical identity of a declared resource.
///
/// Internally uses `Arc<str>` for cheap cloning (reference count bump only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    /// Creates a resource ID from a string identity.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity as seen by the value layer's dependency sets.
    #[must_use]
    pub fn source_id(&self) -> SourceId {
        SourceId::new(Arc::clone(&self.0))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-owning back reference to the declaring parent.
///
/// Used only for naming and introspection; ownership always runs from the
/// parent down to the node, never the other way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    name: Arc<str>,
}

impl ParentRef {
    /// Creates a parent reference with the given name.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the parent's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produces the parent-scoped logical identity for a child.
    #[must_use]
    pub fn child_id(&self, child: &str) -> ResourceId {
        ResourceId::new(format!("{}/{child}", self.name))
    }
}

/// One declared remote resource.
///
/// `depends_on` is always a superset of the dependency sets embedded in the
/// draft's deferred fields; it may additionally contain explicit
/// dependencies declared by the composite author.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    id: ResourceId,
    kind: ResourceKind,
    parent: ParentRef,
    draft: Draft,
    depends_on: DepSet,
}

impl ResourceNode {
    /// Constructs a node record. Only the declaring scope builds these.
    pub(crate) fn new(
        id: ResourceId,
        kind: ResourceKind,
        parent: ParentRef,
        draft: Draft,
        depends_on: DepSet,
    ) -> Self {
        Self {
            id,
            kind,
            parent,
            draft,
            depends_on,
        }
    }

    /// The node's logical identity.
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// The node's resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The non-owning parent back reference.
    #[must_use]
    pub fn parent(&self) -> &ParentRef {
        &self.parent
    }

    /// The draft the node was declared with (post-transform).
    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// The full dependency set computed at declaration time.
    #[must_use]
    pub fn depends_on(&self) -> &DepSet {
        &self.depends_on
    }

    /// Returns `true` if this node depends on the given resource.
    #[must_use]
    pub fn depends_on_id(&self, other: &ResourceId) -> bool {
        self.depends_on.contains(&other.source_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(format!("{}", ResourceKind::Function), "function");
        assert_eq!(format!("{}", ResourceKind::TopicRule), "topic_rule");
        assert_eq!(format!("{}", ResourceKind::Permission), "permission");
    }

    #[test]
    fn resource_id_to_source_id() {
        let id = ResourceId::new("app/handler");
        assert_eq!(id.source_id(), SourceId::new("app/handler"));
        assert_eq!(format!("{id}"), "app/handler");
    }

    #[test]
    fn parent_ref_child_id() {
        let parent = ParentRef::new("app");
        assert_eq!(parent.child_id("handler").as_str(), "app/handler");
        assert_eq!(parent.name(), "app");
    }

    #[test]
    fn node_accessors() {
        let deps = DepSet::singleton(SourceId::new("app/handler"));
        let node = ResourceNode::new(
            ResourceId::new("app/rule"),
            ResourceKind::TopicRule,
            ParentRef::new("app"),
            Draft::new().with("name", "app-rule"),
            deps,
        );

        assert_eq!(node.id().as_str(), "app/rule");
        assert_eq!(node.kind(), ResourceKind::TopicRule);
        assert_eq!(node.parent().name(), "app");
        assert!(node.depends_on_id(&ResourceId::new("app/handler")));
        assert!(!node.depends_on_id(&ResourceId::new("app/other")));
    }
}
