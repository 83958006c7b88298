//! Upstream source identities and dependency sets.
//!
//! A [`SourceId`] names the resource a deferred value originates from. The
//! value layer never interprets the identity; it only carries it so that
//! downstream consumers can be ordered after the source. A [`DepSet`] is the
//! set of identities a value transitively depends on.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;

/// Opaque identity of an upstream resource.
///
/// Internally uses `Arc<str>` for cheap cloning (reference count bump only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(Arc<str>);

impl SourceId {
    /// Creates a source ID from a string identity.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of upstream source identities.
///
/// Dependency sets only ever grow: every combinator in this crate produces
/// an output whose set is the union of its inputs' sets. Dependency
/// information is structural and is recorded even when the underlying value
/// is already known, so ordering never depends on resolution timing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepSet(HashSet<SourceId>);

impl DepSet {
    /// Creates an empty dependency set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set containing a single source.
    #[must_use]
    pub fn singleton(source: SourceId) -> Self {
        let mut set = Self::new();
        set.insert(source);
        set
    }

    /// Adds a source to the set. Returns `true` if it was not already present.
    pub fn insert(&mut self, source: SourceId) -> bool {
        self.0.insert(source)
    }

    /// Returns `true` if the set contains the given source.
    #[must_use]
    pub fn contains(&self, source: &SourceId) -> bool {
        self.0.contains(source)
    }

    /// Merges all sources from `other` into this set.
    pub fn union_with(&mut self, other: &DepSet) {
        for source in other.iter() {
            self.0.insert(source.clone());
        }
    }

    /// Returns `true` if every source in `other` is also in this set.
    #[must_use]
    pub fn is_superset(&self, other: &DepSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Iterates over the sources in the set (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &SourceId> {
        self.0.iter()
    }

    /// Returns the number of sources in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<SourceId> for DepSet {
    fn from_iter<I: IntoIterator<Item = SourceId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
