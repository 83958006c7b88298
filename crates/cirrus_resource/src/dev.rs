//! Manual engine for tests and development.
//!
//! [`ManualEngine`] implements [`Provisioner`] without touching any remote
//! API. It records every request in acceptance order and keeps the
//! completion handles, so a test can resolve or fail individual resources
//! at exactly the point it wants to observe, or leave them pending to
//! exercise cancellation paths.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cirrus_resource::dev::ManualEngine;
//! use cirrus_resource::draft::Draft;
//! use cirrus_resource::node::{ResourceId, ResourceKind};
//! use cirrus_resource::scope::Scope;
//! use cirrus_value::DepSet;
//!
//! let engine = Arc::new(ManualEngine::new());
//! let mut scope = Scope::new("app", engine.clone());
//!
//! let id = ResourceId::new("app/handler");
//! let handle = scope
//!     .declare(ResourceKind::Function, id.clone(), Draft::new(), DepSet::new())
//!     .unwrap();
//!
//! engine.resolve(&id, "arn:function:handler", "app-handler");
//! assert_eq!(handle.arn.try_get(), Some(Ok("arn:function:handler".to_string())));
//! ```

use parking_lot::Mutex;

use hashbrown::HashMap;

use cirrus_value::ResolveError;

use crate::engine::{HandleResolvers, ProvisionRequest, Provisioner, ResourceHandle};
use crate::node::ResourceId;

/// A recording engine whose resources are settled by hand.
#[derive(Debug, Default)]
pub struct ManualEngine {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requests: Vec<ProvisionRequest>,
    resolvers: HashMap<ResourceId, HandleResolvers>,
}

impl ManualEngine {
    /// Creates an engine with no accepted requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All accepted requests, in acceptance order.
    #[must_use]
    pub fn requests(&self) -> Vec<ProvisionRequest> {
        self.inner.lock().requests.clone()
    }

    /// The accepted request for `id`, if any.
    #[must_use]
    pub fn request(&self, id: &ResourceId) -> Option<ProvisionRequest> {
        self.inner
            .lock()
            .requests
            .iter()
            .find(|request| &request.id == id)
            .cloned()
    }

    /// Resolves the outputs of `id` with the given ARN and physical name.
    ///
    /// Returns `false` if the resource is unknown or already settled.
    pub fn resolve(&self, id: &ResourceId, arn: &str, name: &str) -> bool {
        let Some(resolvers) = self.inner.lock().resolvers.remove(id) else {
            return false;
        };
        resolvers.arn.resolve(arn.to_string());
        resolvers.name.resolve(name.to_string());
        true
    }

    /// Fails the outputs of `id`, naming it as the failed source.
    ///
    /// Returns `false` if the resource is unknown or already settled.
    pub fn fail(&self, id: &ResourceId, reason: &str) -> bool {
        let Some(resolvers) = self.inner.lock().resolvers.remove(id) else {
            return false;
        };
        let error = ResolveError::Failed {
            source: id.source_id(),
            reason: reason.to_string(),
        };
        resolvers.arn.fail(error.clone());
        resolvers.name.fail(error);
        true
    }

    /// Resolves every still-unsettled resource with derived outputs.
    ///
    /// The physical name comes from the draft's `name` field when it is a
    /// literal, otherwise from the last segment of the logical identity;
    /// the ARN is `arn:{kind}:{physical-name}`. Resolution follows
    /// acceptance order.
    pub fn resolve_all(&self) {
        let (pending, mut resolvers) = {
            let mut inner = self.inner.lock();
            let resolvers = core::mem::take(&mut inner.resolvers);
            let pending: Vec<ProvisionRequest> = inner
                .requests
                .iter()
                .filter(|request| resolvers.contains_key(&request.id))
                .cloned()
                .collect();
            (pending, resolvers)
        };

        for request in pending {
            let physical = request
                .draft
                .get("name")
                .and_then(|field| field.as_literal())
                .map_or_else(
                    || {
                        request
                            .id
                            .as_str()
                            .rsplit('/')
                            .next()
                            .unwrap_or(request.id.as_str())
                            .to_string()
                    },
                    str::to_string,
                );
            let arn = format!("arn:{}:{physical}", request.kind);
            if let Some(handle) = resolvers.remove(&request.id) {
                handle.arn.resolve(arn);
                handle.name.resolve(physical);
            }
        }
    }
}

impl Provisioner for ManualEngine {
    fn provision(&self, request: ProvisionRequest) -> ResourceHandle {
        let (handle, resolvers) = ResourceHandle::pending(&request.id);
        let mut inner = self.inner.lock();
        inner.resolvers.insert(request.id.clone(), resolvers);
        inner.requests.push(request);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::Draft;
    use crate::node::{ParentRef, ResourceKind};
    use cirrus_value::DepSet;

    fn request(id: &str, draft: Draft) -> ProvisionRequest {
        ProvisionRequest {
            id: ResourceId::new(id),
            kind: ResourceKind::Function,
            parent: ParentRef::new("app"),
            draft,
            depends_on: DepSet::new(),
        }
    }

    #[test]
    fn records_requests_in_order() {
        let engine = ManualEngine::new();
        engine.provision(request("app/a", Draft::new()));
        engine.provision(request("app/b", Draft::new()));

        let ids: Vec<_> = engine
            .requests()
            .iter()
            .map(|r| r.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["app/a", "app/b"]);
    }

    #[test]
    fn manual_resolution() {
        let engine = ManualEngine::new();
        let handle = engine.provision(request("app/a", Draft::new()));

        assert!(engine.resolve(&ResourceId::new("app/a"), "arn:x", "x"));
        assert_eq!(handle.arn.try_get(), Some(Ok("arn:x".to_string())));

        // Second resolution attempt is a no-op.
        assert!(!engine.resolve(&ResourceId::new("app/a"), "arn:y", "y"));
    }

    #[test]
    fn failure_names_the_source() {
        let engine = ManualEngine::new();
        let handle = engine.provision(request("app/a", Draft::new()));

        engine.fail(&ResourceId::new("app/a"), "quota exceeded");

        let err = handle.arn.try_get().unwrap().unwrap_err();
        assert!(err.to_string().contains("app/a"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn resolve_all_uses_draft_name_when_present() {
        let engine = ManualEngine::new();
        let named = engine.provision(request("app/a", Draft::new().with("name", "custom-name")));
        let unnamed = engine.provision(request("app/b", Draft::new()));

        engine.resolve_all();

        assert_eq!(named.name.try_get(), Some(Ok("custom-name".to_string())));
        assert_eq!(
            named.arn.try_get(),
            Some(Ok("arn:function:custom-name".to_string()))
        );
        assert_eq!(unnamed.name.try_get(), Some(Ok("b".to_string())));
    }

    #[test]
    fn resolve_all_skips_already_settled() {
        let engine = ManualEngine::new();
        let handle = engine.provision(request("app/a", Draft::new()));
        engine.fail(&ResourceId::new("app/a"), "boom");

        engine.resolve_all();

        assert!(matches!(handle.arn.try_get(), Some(Err(_))));
    }
}
