//! # Cirrus Internal Library
//!
//! Re-exports the core Cirrus crates for convenience.

/// Layer 1: Deferred value primitives.
pub use cirrus_value;

/// Layer 2: Resource declaration and ownership.
pub use cirrus_resource;

/// Layer 2: Composite resource units.
pub use cirrus_composite;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use cirrus_composite::prelude::*;
    pub use cirrus_resource::prelude::*;
    pub use cirrus_value::prelude::*;
}
