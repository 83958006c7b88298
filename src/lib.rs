//! A composite-resource wiring runtime for infrastructure provisioning.
//!

pub use cirrus_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use cirrus_internal::prelude::*;
}
