//! Exclusive ownership of declared nodes and teardown.
//!
//! A [`Scope`] is the ownership arena for one composite's resources. It
//! owns every [`ResourceNode`] it declares by value, enforces that no
//! identity is declared twice, and is the single place where pending
//! outputs become cancelled: tearing the scope down (or dropping it)
//! settles every still-pending handle output into the terminal cancelled
//! state so no consumer hangs.
//!
//! Declaration is synchronous and non-blocking. The scope computes a
//! node's full dependency set (implicit, from deferred draft fields, union
//! explicit) *before* handing the draft to the engine, so the engine can
//! schedule provisioning correctly even when every referenced value is
//! already resolved.

use std::sync::Arc;

use hashbrown::HashMap;

use cirrus_value::DepSet;

use crate::draft::Draft;
use crate::engine::{ProvisionRequest, Provisioner, ResourceHandle};
use crate::node::{ParentRef, ResourceId, ResourceKind, ResourceNode};

/// Errors raised by scope declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    /// The identity was already declared in this scope. Resources are
    /// exclusively owned and write-once; a second declaration is always a
    /// wiring bug, never a merge.
    #[error("resource '{0}' already declared in this scope")]
    DuplicateIdentity(ResourceId),
}

/// Ownership arena for one composite's declared resources.
pub struct Scope {
    name: Arc<str>,
    engine: Arc<dyn Provisioner>,
    nodes: Vec<ResourceNode>,
    handles: HashMap<ResourceId, ResourceHandle>,
}

impl Scope {
    /// Creates an empty scope backed by the given engine.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, engine: Arc<dyn Provisioner>) -> Self {
        Self {
            name: name.into(),
            engine,
            nodes: Vec::new(),
            handles: HashMap::new(),
        }
    }

    /// Returns the scope's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A non-owning back reference to this scope, for node parentage.
    #[must_use]
    pub fn parent_ref(&self) -> ParentRef {
        ParentRef::new(Arc::clone(&self.name))
    }

    /// Declares a resource and hands it to the engine.
    ///
    /// The node's dependency set is the union of the dependency sets of
    /// every deferred field in `draft` plus `explicit_deps`, computed here
    /// so the edge is discoverable before any remote call. The returned
    /// handle's outputs carry the new node's identity, making any consumer
    /// of them depend on it.
    ///
    /// # Errors
    ///
    /// [`ScopeError::DuplicateIdentity`] if `id` was already declared.
    pub fn declare(
        &mut self,
        kind: ResourceKind,
        id: ResourceId,
        draft: Draft,
        explicit_deps: DepSet,
    ) -> Result<ResourceHandle, ScopeError> {
        if self.handles.contains_key(&id) {
            return Err(ScopeError::DuplicateIdentity(id));
        }

        let mut depends_on = draft.deferred_deps();
        depends_on.union_with(&explicit_deps);

        tracing::debug!(
            scope = %self.name,
            resource = %id,
            %kind,
            deps = depends_on.len(),
            "declaring resource"
        );

        let node = ResourceNode::new(
            id.clone(),
            kind,
            self.parent_ref(),
            draft.clone(),
            depends_on.clone(),
        );
        let handle = self.engine.provision(ProvisionRequest {
            id: id.clone(),
            kind,
            parent: self.parent_ref(),
            draft,
            depends_on,
        });

        self.nodes.push(node);
        self.handles.insert(id, handle.clone());
        Ok(handle)
    }

    /// Returns the declared node with the given identity.
    #[must_use]
    pub fn node(&self, id: &ResourceId) -> Option<&ResourceNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// All declared nodes, in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// Returns the output handle for a declared resource.
    #[must_use]
    pub fn handle(&self, id: &ResourceId) -> Option<&ResourceHandle> {
        self.handles.get(id)
    }

    /// Returns the number of declared resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tears the scope down, cancelling every still-pending output.
    ///
    /// Consumers of those outputs observe the terminal cancelled state.
    /// Dropping the scope has the same effect; this method just makes the
    /// teardown point explicit.
    pub fn teardown(self) {
        drop(self);
    }

    fn cancel_pending(&mut self) {
        for handle in self.handles.values() {
            handle.cancel();
        }
        if !self.handles.is_empty() {
            tracing::debug!(scope = %self.name, "scope torn down");
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl core::fmt::Debug for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::ManualEngine;
    use cirrus_value::{ResolveError, SourceId};

    fn scope_with_engine() -> (Scope, Arc<ManualEngine>) {
        let engine = Arc::new(ManualEngine::new());
        let scope = Scope::new("app", engine.clone() as Arc<dyn Provisioner>);
        (scope, engine)
    }

    #[test]
    fn declare_records_node_and_handle() {
        let (mut scope, engine) = scope_with_engine();

        let handle = scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/handler"),
                Draft::new().with("handler", "index.entry"),
                DepSet::new(),
            )
            .unwrap();

        assert_eq!(scope.len(), 1);
        assert!(scope.node(&ResourceId::new("app/handler")).is_some());
        assert!(handle.arn.is_pending());
        assert_eq!(engine.requests().len(), 1);
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let (mut scope, _engine) = scope_with_engine();
        let id = ResourceId::new("app/handler");

        scope
            .declare(ResourceKind::Function, id.clone(), Draft::new(), DepSet::new())
            .unwrap();
        let err = scope
            .declare(ResourceKind::Function, id.clone(), Draft::new(), DepSet::new())
            .unwrap_err();

        assert_eq!(err, ScopeError::DuplicateIdentity(id));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn depends_on_unions_implicit_and_explicit() {
        let (mut scope, engine) = scope_with_engine();

        let upstream = scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/handler"),
                Draft::new(),
                DepSet::new(),
            )
            .unwrap();

        let explicit = DepSet::singleton(SourceId::new("external/db"));
        scope
            .declare(
                ResourceKind::TopicRule,
                ResourceId::new("app/rule"),
                Draft::new().with("action_target", upstream.arn.clone()),
                explicit,
            )
            .unwrap();

        let node = scope.node(&ResourceId::new("app/rule")).unwrap();
        assert!(node.depends_on_id(&ResourceId::new("app/handler")));
        assert!(node.depends_on().contains(&SourceId::new("external/db")));
        assert_eq!(node.depends_on().len(), 2);

        // The engine saw the same set.
        let request = engine.request(&ResourceId::new("app/rule")).unwrap();
        assert_eq!(request.depends_on, node.depends_on().clone());
    }

    #[test]
    fn deps_recorded_even_when_value_already_resolved() {
        let (mut scope, engine) = scope_with_engine();

        let upstream = scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/handler"),
                Draft::new(),
                DepSet::new(),
            )
            .unwrap();
        engine.resolve_all();
        assert!(upstream.arn.is_settled());

        scope
            .declare(
                ResourceKind::TopicRule,
                ResourceId::new("app/rule"),
                Draft::new().with("action_target", upstream.arn.clone()),
                DepSet::new(),
            )
            .unwrap();

        let node = scope.node(&ResourceId::new("app/rule")).unwrap();
        assert!(node.depends_on_id(&ResourceId::new("app/handler")));
    }

    #[test]
    fn teardown_cancels_pending_outputs() {
        let (mut scope, _engine) = scope_with_engine();

        let handle = scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/handler"),
                Draft::new(),
                DepSet::new(),
            )
            .unwrap();

        scope.teardown();

        assert_eq!(handle.arn.try_get(), Some(Err(ResolveError::Cancelled)));
        assert_eq!(handle.name.try_get(), Some(Err(ResolveError::Cancelled)));
    }

    #[test]
    fn teardown_leaves_resolved_outputs_intact() {
        let (mut scope, engine) = scope_with_engine();

        let handle = scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/handler"),
                Draft::new(),
                DepSet::new(),
            )
            .unwrap();
        engine.resolve_all();
        let resolved = handle.arn.try_get();

        scope.teardown();

        assert_eq!(handle.arn.try_get(), resolved);
        assert!(matches!(handle.arn.try_get(), Some(Ok(_))));
    }

    #[tokio::test]
    async fn handle_outputs_are_awaitable() {
        let (mut scope, engine) = scope_with_engine();
        let handle = scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/handler"),
                Draft::new(),
                DepSet::new(),
            )
            .unwrap();

        engine.resolve_all();

        assert_eq!(
            handle.arn.clone().await,
            Ok("arn:function:handler".to_string())
        );
        assert_eq!(handle.name.clone().await, Ok("handler".to_string()));
    }

    #[test]
    fn drop_cancels_like_teardown() {
        let (mut scope, _engine) = scope_with_engine();
        let handle = scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/handler"),
                Draft::new(),
                DepSet::new(),
            )
            .unwrap();

        drop(scope);

        assert_eq!(handle.arn.try_get(), Some(Err(ResolveError::Cancelled)));
    }
}
