//! Deferred value primitives for Cirrus (Layer 1).
//!
//! `cirrus_value` provides the foundational types for wiring remote
//! resources together before their identities are known:
//!
//! - [`Deferred`] - An asynchronously resolved value with explicit terminal
//!   states (resolved, failed, cancelled)
//! - [`SourceId`] / [`DepSet`] - Opaque upstream identities and the set
//!   algebra used to track which resources a value depends on
//! - [`combine`] - Combinators (`map`, `zip`, `interpolate`) that derive new
//!   deferred values while merging dependency sets
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Cirrus architecture:
//!
//! - **Layer 1** (`cirrus_value`): Deferred value primitives (this crate)
//! - **Layer 2** (`cirrus_resource`): Resource declaration and ownership
//! - **Layer 2** (`cirrus_composite`): Composite units built from resources
//!
//! # Example
//!
//! ```
//! use cirrus_value::{Deferred, SourceId, combine};
//!
//! let (arn, resolver) = Deferred::<String>::pending();
//! let arn = arn.with_source(SourceId::new("app/handler"));
//!
//! // Derived values carry the upstream identity along.
//! let target = combine::interpolate("target={}", &[arn.clone()]);
//! assert!(target.deps().contains(&SourceId::new("app/handler")));
//!
//! resolver.resolve("arn:function:handler".to_string());
//! assert_eq!(target.try_get(), Some(Ok("target=arn:function:handler".to_string())));
//! ```

/// Combinators that derive deferred values while merging dependency sets.
pub mod combine;

/// The deferred value cell and its completion handle.
pub mod deferred;

/// Upstream source identities and dependency sets.
pub mod source;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::combine::{interpolate, zip};
    pub use crate::deferred::{Deferred, ResolveError, Resolver, Settled};
    pub use crate::source::{DepSet, SourceId};
}

pub use deferred::{Deferred, ResolveError, Resolver, Settled};
pub use source::{DepSet, SourceId};
