//! The external provisioning engine boundary.
//!
//! This layer never issues remote calls itself. It prepares a
//! [`ProvisionRequest`] carrying a resource's full dependency set and hands
//! it to a [`Provisioner`], which returns a [`ResourceHandle`] whose typed
//! outputs resolve asynchronously. Scheduling, retries, and state
//! persistence are entirely the engine's concern; the contract here is only
//! that every dependency edge is discoverable from the request before any
//! remote call is made.

use core::fmt;

use cirrus_value::{DepSet, Deferred, Resolver};

use crate::draft::Draft;
use crate::node::{ParentRef, ResourceId, ResourceKind};

/// Everything the external engine needs to provision one resource.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    /// Logical identity of the resource.
    pub id: ResourceId,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Non-owning back reference to the declaring parent.
    pub parent: ParentRef,
    /// Post-transform construction arguments.
    pub draft: Draft,
    /// Full dependency set: implicit (from deferred draft fields) union
    /// explicit. The engine must order this resource after every source in
    /// the set.
    pub depends_on: DepSet,
}

/// Typed outputs of one provisioned resource.
///
/// Both outputs carry the node's own identity in their dependency sets, so
/// a draft field referencing either output makes the consuming node depend
/// on this one. Cloning shares the underlying cells.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    /// The provisioned resource's ARN.
    pub arn: Deferred<String>,
    /// The provisioned resource's physical name.
    pub name: Deferred<String>,
}

impl ResourceHandle {
    /// Creates a pending handle for `id` together with its resolvers.
    ///
    /// Engines call this when accepting a request, keep the resolvers, and
    /// settle them as provisioning completes or fails.
    #[must_use]
    pub fn pending(id: &ResourceId) -> (Self, HandleResolvers) {
        let source = id.source_id();
        let (arn, arn_resolver) = Deferred::pending();
        let (name, name_resolver) = Deferred::pending();
        let handle = Self {
            arn: arn.with_source(source.clone()),
            name: name.with_source(source),
        };
        let resolvers = HandleResolvers {
            arn: arn_resolver,
            name: name_resolver,
        };
        (handle, resolvers)
    }

    /// Settles any still-pending output as cancelled.
    ///
    /// Called by the owning scope during teardown.
    pub fn cancel(&self) {
        self.arn.cancel();
        self.name.cancel();
    }
}

/// Engine-side completion handles for one [`ResourceHandle`].
pub struct HandleResolvers {
    /// Resolver for the ARN output.
    pub arn: Resolver<String>,
    /// Resolver for the physical name output.
    pub name: Resolver<String>,
}

impl fmt::Debug for HandleResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleResolvers").finish_non_exhaustive()
    }
}

/// The external provisioning engine.
///
/// Implementations guarantee an at-least-once provisioning attempt per
/// accepted request and surface per-resource failures through the returned
/// handle's outputs.
pub trait Provisioner: Send + Sync {
    /// Accepts a resource for provisioning and returns its output handle.
    ///
    /// Must not block: the handle's outputs resolve asynchronously under
    /// the engine's own schedule.
    fn provision(&self, request: ProvisionRequest) -> ResourceHandle;
}
