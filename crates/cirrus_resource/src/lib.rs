//! Resource declaration and ownership primitives for Cirrus (Layer 2).
//!
//! `cirrus_resource` sits between the deferred value layer and composite
//! units. It provides:
//!
//! - [`draft`] - Loosely-typed construction arguments ([`Draft`]) and the
//!   transform hook mechanism with owned-field re-assertion
//! - [`node`] - Declared resources ([`ResourceNode`]) with their computed
//!   dependency sets
//! - [`engine`] - The boundary to the external provisioning engine
//!   ([`Provisioner`])
//! - [`scope`] - Exclusive ownership of declared nodes and teardown
//!   ([`Scope`])
//! - [`dev`] - A manual engine for tests and development
//!
//! # Architecture
//!
//! This crate is Layer 2 of the Cirrus architecture:
//!
//! - **Layer 1** (`cirrus_value`): Deferred value primitives
//! - **Layer 2** (`cirrus_resource`): Resource declaration (this crate)
//! - **Layer 2** (`cirrus_composite`): Composite units built from resources
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
//! let draft = Draft::new().with("handler", "index.entry");
//! let handle = scope
//!     .declare(ResourceKind::Function, ResourceId::new("app/handler"), draft, DepSet::new())
//!     .unwrap();
//!
//! engine.resolve_all();
//! assert!(handle.arn.is_settled());
//! ```

/// Manual engine for tests and development.
pub mod dev;

/// Loosely-typed construction arguments and transform hooks.
pub mod draft;

/// The external provisioning engine boundary.
pub mod engine;

/// Declared resources and their dependency sets.
pub mod node;

/// Exclusive ownership of declared nodes and teardown.
pub mod scope;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::dev::ManualEngine;
    pub use crate::draft::{Draft, FieldValue, Transform, apply_transform};
    pub use crate::engine::{ProvisionRequest, Provisioner, ResourceHandle};
    pub use crate::node::{ParentRef, ResourceId, ResourceKind, ResourceNode};
    pub use crate::scope::{Scope, ScopeError};
}

pub use draft::{Draft, FieldValue, Transform, apply_transform};
pub use engine::{ProvisionRequest, Provisioner, ResourceHandle};
pub use node::{ParentRef, ResourceId, ResourceKind, ResourceNode};
pub use scope::{Scope, ScopeError};
