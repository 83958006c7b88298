//! Construction-time validation failures.
//!
//! Missing or malformed required configuration is reported synchronously at
//! build time, never deferred into a value: a caller cannot fix a missing
//! field by waiting. When a build fails, no child resource has been
//! declared.

use cirrus_resource::scope::ScopeError;

/// Errors raised while building a composite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A required configuration field was not supplied.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A configuration field was supplied but malformed.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// A child identity clashed with a resource already declared in the
    /// target scope.
    #[error(transparent)]
    Scope(#[from] ScopeError),
}
