//! The topic subscription composite.
//!
//! A [`TopicSubscription`] wires a topic filter to a subscriber function
//! using three remote resources, declared in dependency order:
//!
//! 1. **Function** - the compute function running the subscriber's handler
//! 2. **Topic rule** - the event-routing rule matching the filter, whose
//!    action targets the function's ARN
//! 3. **Permission** - the invocation permission allowing the rule to call
//!    the function
//!
//! The rule references the function's ARN and the permission references both
//! the rule's ARN and the function's name, so the recorded dependency chain
//! is always function → rule → permission regardless of when the engine
//! resolves anything.
//!
//! Callers customize any child's draft through a per-kind [`TransformMap`].
//! Fields that carry the composite's internal wiring (generated names and
//! linkage values) are composite-owned and re-asserted after the hook runs;
//! everything else is fair game.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use cirrus_composite::{TopicSubscription, TopicSubscriptionConfig};
//! use cirrus_resource::draft::Transform;
//! use cirrus_resource::dev::ManualEngine;
//! use cirrus_resource::node::ResourceKind;
//! use cirrus_resource::scope::Scope;
//!
//! let engine = Arc::new(ManualEngine::new());
//! let mut scope = Scope::new("app", engine.clone());
//!
//! let config = TopicSubscriptionConfig::new()
//!     .with_subscriber("handler.entry")
//!     .with_transform(
//!         ResourceKind::Function,
//!         Transform::new(|draft| draft.with("memory", 512i64)),
//!     );
//! let sub = TopicSubscription::build("ingest", config, &mut scope).unwrap();
//!
//! assert_eq!(
//!     sub.output_names(),
//!     vec!["function_arn", "permission_arn", "rule_arn"],
//! );
//! ```

use hashbrown::HashMap;

use cirrus_resource::draft::{Draft, Transform, apply_transform};
use cirrus_resource::engine::ResourceHandle;
use cirrus_resource::node::{ResourceId, ResourceKind};
use cirrus_resource::scope::Scope;
use cirrus_value::combine::interpolate;
use cirrus_value::{DepSet, Deferred};

use crate::composite::Composite;
use crate::error::BuildError;

/// Wildcard sentinel matching every topic.
///
/// A missing `filter` silently defaults to this, subscribing the function
/// to everything.
pub const MATCH_ALL_FILTER: &str = "#";

/// Runtime used when the caller does not specify one.
const DEFAULT_RUNTIME: &str = "provided.al2023";

/// Composite-owned fields per child kind. These carry the generated names
/// and linkage values that make the wiring correct; a transform hook can
/// never change them in the final draft.
const FUNCTION_OWNED: &[&'static str] = &["name"];
const RULE_OWNED: &[&'static str] = &["name", "action_target"];
const PERMISSION_OWNED: &[&'static str] = &[
    "statement_id",
    "action",
    "principal",
    "function_name",
    "source_arn",
];

// ─────────────────────────────────────────────────────────────────────────────
// TransformMap
// ─────────────────────────────────────────────────────────────────────────────

/// Per-child-kind transform hooks.
///
/// At most one hook per [`ResourceKind`]; kinds without a hook get the
/// composite defaults unchanged.
#[derive(Debug, Clone, Default)]
pub struct TransformMap {
    hooks: HashMap<ResourceKind, Transform>,
}

impl TransformMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook for a kind, replacing any previous one.
    pub fn insert(&mut self, kind: ResourceKind, hook: Transform) {
        self.hooks.insert(kind, hook);
    }

    /// Builder-style [`insert`](TransformMap::insert).
    #[must_use]
    pub fn with(mut self, kind: ResourceKind, hook: Transform) -> Self {
        self.insert(kind, hook);
        self
    }

    /// Returns the hook for a kind, if any.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<&Transform> {
        self.hooks.get(&kind)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TopicSubscriptionConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Caller-supplied configuration for [`TopicSubscription::build`].
#[derive(Debug, Clone, Default)]
pub struct TopicSubscriptionConfig {
    subscriber: Option<String>,
    filter: Option<String>,
    runtime: Option<String>,
    transforms: TransformMap,
}

impl TopicSubscriptionConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subscriber's handler entry point (required).
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: impl Into<String>) -> Self {
        self.subscriber = Some(subscriber.into());
        self
    }

    /// Sets the topic filter. Defaults to [`MATCH_ALL_FILTER`] when absent.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the function runtime.
    #[must_use]
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    /// Adds a transform hook for one child kind.
    #[must_use]
    pub fn with_transform(mut self, kind: ResourceKind, hook: Transform) -> Self {
        self.transforms.insert(kind, hook);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TopicSubscription
// ─────────────────────────────────────────────────────────────────────────────

/// A built topic subscription: three children and a fixed output surface.
///
/// Public outputs are exactly `function_arn`, `rule_arn`, and
/// `permission_arn`; the child handles are additionally exposed for
/// downstream composition and testing. Internal draft-merging state is not
/// part of the surface.
#[derive(Debug)]
pub struct TopicSubscription {
    composite: Composite,
    function: ResourceHandle,
    rule: ResourceHandle,
    permission: ResourceHandle,
}

impl TopicSubscription {
    /// Builds the composite, declaring its three children into `scope`.
    ///
    /// Children are declared in dependency order (function, rule,
    /// permission) with each linkage field referencing the previous child's
    /// outputs, so every dependency edge is discoverable from the declared
    /// nodes before the engine provisions anything. Per-kind transform
    /// hooks from the configuration run against each child's defaults, with
    /// composite-owned fields re-asserted afterwards.
    ///
    /// # Errors
    ///
    /// - [`BuildError::MissingField`] if no subscriber was configured
    /// - [`BuildError::InvalidField`] if the subscriber is empty
    /// - [`BuildError::Scope`] if a child identity is already taken
    ///
    /// On error nothing has been declared into `scope`.
    pub fn build(
        name: &str,
        config: TopicSubscriptionConfig,
        scope: &mut Scope,
    ) -> Result<Self, BuildError> {
        let subscriber = config
            .subscriber
            .ok_or(BuildError::MissingField("subscriber"))?;
        if subscriber.trim().is_empty() {
            return Err(BuildError::InvalidField {
                field: "subscriber",
                reason: "handler entry point is empty",
            });
        }

        let function_id = ResourceId::new(format!("{name}/handler"));
        let rule_id = ResourceId::new(format!("{name}/rule"));
        let permission_id = ResourceId::new(format!("{name}/permission"));
        for id in [&function_id, &rule_id, &permission_id] {
            if scope.node(id).is_some() {
                return Err(BuildError::Scope(
                    cirrus_resource::scope::ScopeError::DuplicateIdentity(id.clone()),
                ));
            }
        }

        // Normalization: the filter is wrapped as a deferred even though it
        // is a plain default, so downstream handling is uniform.
        let filter = Deferred::resolved(
            config
                .filter
                .unwrap_or_else(|| MATCH_ALL_FILTER.to_string()),
        );
        let runtime = config
            .runtime
            .unwrap_or_else(|| DEFAULT_RUNTIME.to_string());

        let function = {
            let defaults = Draft::new()
                .with("name", child_name(name, "handler"))
                .with("handler", subscriber.clone())
                .with("runtime", runtime);
            let draft = apply_transform(
                config.transforms.get(ResourceKind::Function),
                defaults,
                FUNCTION_OWNED,
            );
            scope.declare(
                ResourceKind::Function,
                function_id.clone(),
                draft,
                DepSet::new(),
            )?
        };

        let rule = {
            let defaults = Draft::new()
                .with("name", child_name(name, "rule"))
                .with("topic_filter", filter.clone())
                .with("sql", interpolate("SELECT * FROM '{}'", &[filter]))
                .with("enabled", true)
                .with("action_target", function.arn.clone());
            let draft = apply_transform(
                config.transforms.get(ResourceKind::TopicRule),
                defaults,
                RULE_OWNED,
            );
            scope.declare(ResourceKind::TopicRule, rule_id.clone(), draft, DepSet::new())?
        };

        let permission = {
            let defaults = Draft::new()
                .with("statement_id", child_name(name, "invoke"))
                .with("action", "invoke:Function")
                .with("principal", "topics.cirrus.internal")
                .with("function_name", function.name.clone())
                .with("source_arn", rule.arn.clone());
            let draft = apply_transform(
                config.transforms.get(ResourceKind::Permission),
                defaults,
                PERMISSION_OWNED,
            );
            scope.declare(
                ResourceKind::Permission,
                permission_id.clone(),
                draft,
                DepSet::new(),
            )?
        };

        tracing::info!(
            composite = name,
            scope = scope.name(),
            "topic subscription declared"
        );

        let composite = Composite::builder(name)
            .child(function_id)
            .child(rule_id)
            .child(permission_id)
            .output("function_arn", function.arn.clone())
            .output("rule_arn", rule.arn.clone())
            .output("permission_arn", permission.arn.clone())
            .finish();

        Ok(Self {
            composite,
            function,
            rule,
            permission,
        })
    }

    /// Returns the composite's logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.composite.name()
    }

    /// The child identities, in declaration order.
    #[must_use]
    pub fn children(&self) -> &[ResourceId] {
        self.composite.children()
    }

    /// Looks up a public output by name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Deferred<String>> {
        self.composite.output(name)
    }

    /// The public output names, sorted.
    #[must_use]
    pub fn output_names(&self) -> Vec<&'static str> {
        self.composite.output_names()
    }

    /// The function child's output handle.
    #[must_use]
    pub fn function(&self) -> &ResourceHandle {
        &self.function
    }

    /// The rule child's output handle.
    #[must_use]
    pub fn rule(&self) -> &ResourceHandle {
        &self.rule
    }

    /// The permission child's output handle.
    #[must_use]
    pub fn permission(&self) -> &ResourceHandle {
        &self.permission
    }
}

/// Generates the physical name for a child.
///
/// The name encodes the parent-child relationship and a unique suffix; it
/// is composite-owned in every child draft.
fn child_name(composite: &str, role: &str) -> String {
    format!("{composite}-{role}-{}", nanoid::nanoid!(6))
}
