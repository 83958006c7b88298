//! Composite resource units for Cirrus (Layer 2).
//!
//! `cirrus_composite` assembles several independently-provisioned resources
//! into one reusable unit:
//!
//! - [`Composite`] - Named child list plus a fixed public output mapping
//! - [`TopicSubscription`] - The concrete three-resource composite wiring a
//!   topic filter to a compute function (function, routing rule, invocation
//!   permission)
//! - [`BuildError`] - Eager construction-time validation failures
//!
//! # Architecture
//!
//! This crate is Layer 2 of the Cirrus architecture:
//!
//! - **Layer 1** (`cirrus_value`): Deferred value primitives
//! - **Layer 2** (`cirrus_resource`): Resource declaration and ownership
//! - **Layer 2** (`cirrus_composite`): Composite units (this crate)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cirrus_composite::{TopicSubscription, TopicSubscriptionConfig};
//! use cirrus_resource::dev::ManualEngine;
//! use cirrus_resource::scope::Scope;
//!
//! let engine = Arc::new(ManualEngine::new());
//! let mut scope = Scope::new("app", engine.clone());
//!
//! let config = TopicSubscriptionConfig::new()
//!     .with_subscriber("handler.entry")
//!     .with_filter("devices/+/status");
//! let sub = TopicSubscription::build("ingest", config, &mut scope).unwrap();
//!
//! assert_eq!(scope.len(), 3);
//! assert!(sub.output("rule_arn").is_some());
//! ```

/// The generic composite container and its builder.
pub mod composite;

/// Construction-time validation failures.
pub mod error;

/// The topic subscription composite.
pub mod subscription;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::composite::{Composite, CompositeBuilder};
    pub use crate::error::BuildError;
    pub use crate::subscription::{
        MATCH_ALL_FILTER, TopicSubscription, TopicSubscriptionConfig, TransformMap,
    };
}

pub use composite::{Composite, CompositeBuilder};
pub use error::BuildError;
pub use subscription::{MATCH_ALL_FILTER, TopicSubscription, TopicSubscriptionConfig, TransformMap};
