//! Loosely-typed construction arguments and transform hooks.
//!
//! A [`Draft`] is the raw argument struct handed to the provisioning engine
//! for one resource. Fields may hold plain literals or [`Deferred`] values
//! sourced from other resources; the draft can report the union of all
//! embedded dependency sets via [`Draft::deferred_deps`].
//!
//! A [`Transform`] is a caller-supplied hook that customizes a draft before
//! declaration. Hooks are composed with composite-internal defaults by
//! [`apply_transform`]: the hook runs on a view that includes the defaults,
//! then every composite-owned field is re-asserted from the defaults on top
//! of the hook's output. A hook can freely add or override caller-facing
//! fields; it is structurally unable to change the fields that make the
//! composite's internal wiring correct.
//!
//! # Example
//!
//! ```
//! use cirrus_resource::draft::{Draft, Transform, apply_transform};
//!
//! let defaults = Draft::new()
//!     .with("name", "app-handler")
//!     .with("memory", 128i64);
//!
//! let hook = Transform::new(|draft: Draft| {
//!     draft.with("memory", 512i64).with("name", "hijacked")
//! });
//!
//! let merged = apply_transform(Some(&hook), defaults, &["name"]);
//! assert_eq!(merged.get("memory").unwrap().as_literal(), None); // Int, not Literal
//! assert_eq!(merged.get("name").unwrap().as_literal(), Some("app-handler"));
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use cirrus_value::{DepSet, Deferred};

// ─────────────────────────────────────────────────────────────────────────────
// FieldValue
// ─────────────────────────────────────────────────────────────────────────────

/// A single draft field.
///
/// Deferred fields reference another resource's output; their dependency
/// sets flow into the owning node's `depends_on` at declaration time.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A plain string value.
    Literal(String),
    /// A boolean flag.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A value sourced from another resource, not yet known.
    Deferred(Deferred<String>),
}

impl FieldValue {
    /// Returns the literal string if this field is a [`FieldValue::Literal`].
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            FieldValue::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the deferred value if this field is a [`FieldValue::Deferred`].
    #[must_use]
    pub fn as_deferred(&self) -> Option<&Deferred<String>> {
        match self {
            FieldValue::Deferred(dv) => Some(dv),
            _ => None,
        }
    }

    /// The dependency set contributed by this field.
    #[must_use]
    pub fn deps(&self) -> DepSet {
        match self {
            FieldValue::Deferred(dv) => dv.deps().clone(),
            _ => DepSet::new(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Literal(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Literal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<Deferred<String>> for FieldValue {
    fn from(value: Deferred<String>) -> Self {
        FieldValue::Deferred(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draft
// ─────────────────────────────────────────────────────────────────────────────

/// Raw construction arguments for one resource.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    fields: HashMap<&'static str, FieldValue>,
}

impl Draft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, name: &'static str, value: impl Into<FieldValue>) {
        self.fields.insert(name, value.into());
    }

    /// Builder-style [`set`](Draft::set).
    #[must_use]
    pub fn with(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Gets a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Returns `true` if the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the field names in sorted order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.fields.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the draft has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The union of the dependency sets of every deferred field.
    ///
    /// This is the implicit half of a node's `depends_on`; the declaring
    /// scope unions it with any explicit dependencies before the draft is
    /// handed to the engine.
    #[must_use]
    pub fn deferred_deps(&self) -> DepSet {
        let mut deps = DepSet::new();
        for value in self.fields.values() {
            if let FieldValue::Deferred(dv) = value {
                deps.union_with(dv.deps());
            }
        }
        deps
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// A caller-supplied hook that customizes a draft before declaration.
///
/// Internally an `Arc`, so cloning shares the hook.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(Draft) -> Draft + Send + Sync>);

impl Transform {
    /// Creates a transform from a function.
    #[must_use]
    pub fn new(hook: impl Fn(Draft) -> Draft + Send + Sync + 'static) -> Self {
        Self(Arc::new(hook))
    }

    /// Runs the hook on a draft.
    #[must_use]
    pub fn apply(&self, draft: Draft) -> Draft {
        (self.0)(draft)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").finish_non_exhaustive()
    }
}

/// Composes an optional caller hook with composite-internal defaults.
///
/// If `hook` is absent, `defaults` is returned unchanged. Otherwise the
/// hook runs on a copy of the defaults, and every field named in `owned`
/// is then re-asserted from the defaults on top of the hook's output:
/// present owned fields are restored, and owned fields the hook invented
/// are removed. The hook's changes to all other fields stand.
///
/// An overriding hook is silently corrected, not reported; precedence of
/// the composite's own wiring is the contract.
#[must_use]
pub fn apply_transform(hook: Option<&Transform>, defaults: Draft, owned: &[&'static str]) -> Draft {
    let Some(hook) = hook else {
        return defaults;
    };
    let mut candidate = hook.apply(defaults.clone());
    for &name in owned {
        match defaults.get(name) {
            Some(value) => candidate.set(name, value.clone()),
            None => {
                candidate.remove(name);
            }
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_value::SourceId;

    fn deferred_from(id: &str) -> Deferred<String> {
        Deferred::resolved("value".to_string()).with_source(SourceId::new(id))
    }

    #[test]
    fn draft_set_get_remove() {
        let mut draft = Draft::new();
        draft.set("name", "handler");
        draft.set("enabled", true);
        draft.set("memory", 128i64);

        assert_eq!(draft.len(), 3);
        assert_eq!(draft.get("name").unwrap().as_literal(), Some("handler"));
        assert!(draft.contains("enabled"));

        draft.remove("enabled");
        assert!(!draft.contains("enabled"));
    }

    #[test]
    fn field_names_are_sorted() {
        let draft = Draft::new().with("b", "2").with("a", "1").with("c", "3");
        assert_eq!(draft.field_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn deferred_deps_unions_all_deferred_fields() {
        let draft = Draft::new()
            .with("target", deferred_from("app/handler"))
            .with("source", deferred_from("app/rule"))
            .with("name", "plain");

        let deps = draft.deferred_deps();
        assert_eq!(deps.len(), 2);
        assert!(deps.contains(&SourceId::new("app/handler")));
        assert!(deps.contains(&SourceId::new("app/rule")));
    }

    #[test]
    fn deferred_deps_empty_without_deferred_fields() {
        let draft = Draft::new().with("name", "plain").with("flag", true);
        assert!(draft.deferred_deps().is_empty());
    }

    #[test]
    fn absent_hook_returns_defaults_unchanged() {
        let defaults = Draft::new().with("name", "handler").with("memory", 128i64);
        let merged = apply_transform(None, defaults.clone(), &["name"]);

        assert_eq!(merged.field_names(), defaults.field_names());
        assert_eq!(merged.get("name").unwrap().as_literal(), Some("handler"));
    }

    #[test]
    fn identity_hook_equals_no_hook() {
        let defaults = Draft::new().with("name", "handler").with("memory", 128i64);
        let identity = Transform::new(|draft| draft);

        let with_hook = apply_transform(Some(&identity), defaults.clone(), &["name"]);
        let without = apply_transform(None, defaults, &["name"]);

        assert_eq!(with_hook.field_names(), without.field_names());
        assert_eq!(
            with_hook.get("name").unwrap().as_literal(),
            without.get("name").unwrap().as_literal(),
        );
    }

    #[test]
    fn hook_may_override_unowned_fields() {
        let defaults = Draft::new().with("name", "handler").with("memory", 128i64);
        let hook = Transform::new(|draft: Draft| draft.with("memory", 512i64));

        let merged = apply_transform(Some(&hook), defaults, &["name"]);
        assert!(matches!(merged.get("memory"), Some(FieldValue::Int(512))));
    }

    #[test]
    fn hook_may_add_new_fields() {
        let defaults = Draft::new().with("name", "handler");
        let hook = Transform::new(|draft: Draft| draft.with("timeout", 30i64));

        let merged = apply_transform(Some(&hook), defaults, &["name"]);
        assert!(merged.contains("timeout"));
    }

    #[test]
    fn owned_fields_are_reasserted_after_hook() {
        let defaults = Draft::new().with("name", "app-handler").with("memory", 128i64);
        let hook = Transform::new(|draft: Draft| draft.with("name", "hijacked"));

        let merged = apply_transform(Some(&hook), defaults, &["name"]);
        assert_eq!(merged.get("name").unwrap().as_literal(), Some("app-handler"));
    }

    #[test]
    fn hook_cannot_remove_owned_fields() {
        let defaults = Draft::new().with("source_arn", deferred_from("app/rule"));
        let hook = Transform::new(|mut draft: Draft| {
            draft.remove("source_arn");
            draft
        });

        let merged = apply_transform(Some(&hook), defaults, &["source_arn"]);
        assert!(merged.contains("source_arn"));
        assert!(
            merged
                .get("source_arn")
                .unwrap()
                .deps()
                .contains(&SourceId::new("app/rule"))
        );
    }

    #[test]
    fn hook_cannot_invent_owned_fields() {
        let defaults = Draft::new().with("name", "handler");
        let hook = Transform::new(|draft: Draft| draft.with("source_arn", "forged"));

        let merged = apply_transform(Some(&hook), defaults, &["name", "source_arn"]);
        assert!(!merged.contains("source_arn"));
    }
}
