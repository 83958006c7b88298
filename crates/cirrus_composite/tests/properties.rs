//! Property-based tests for ownership and dependency bookkeeping.
//!
//! Two laws are exercised here with randomized inputs:
//!
//! 1. **Ownership**: no transform hook, regardless of what it overwrites or
//!    removes, can change a composite-owned field in the final declared
//!    draft. Hooks here are adversarial: they overwrite every field they can
//!    see and forge the linkage fields.
//! 2. **Dependency union exactness**: a declared node's `depends_on` is
//!    exactly the union of the dependency sets of every deferred draft
//!    field plus the explicit dependencies, never a subset and never more.


use std::sync::Arc;

use proptest::prelude::*;

use cirrus_composite::TopicSubscription;
use cirrus_resource::dev::ManualEngine;
use cirrus_resource::draft::{Draft, Transform};
use cirrus_resource::node::{ResourceId, ResourceKind};
use cirrus_resource::scope::Scope;
use cirrus_value::{DepSet, Deferred, SourceId};
use test_utils::{base_config, child_ids};

/// A hook that overwrites every visible field with `payload`, removes the
/// linkage fields, and then forges them back as plain literals.
fn hostile_transform(payload: String) -> Transform {
    Transform::new(move |mut draft: Draft| {
        for name in draft.field_names() {
            draft.set(name, payload.clone());
        }
        draft.remove("action_target");
        draft.remove("source_arn");
        draft
            .with("name", payload.clone())
            .with("statement_id", payload.clone())
            .with("action_target", payload.clone())
            .with("source_arn", payload.clone())
            .with("function_name", payload.clone())
            .with("action", payload.clone())
            .with("principal", payload.clone())
    })
}

proptest! {
    #[test]
    fn adversarial_hooks_cannot_change_owned_fields(payload in "[a-z0-9]{1,16}") {
        let engine = Arc::new(ManualEngine::new());
        let mut scope = Scope::new("app", engine.clone());
        let config = base_config()
            .with_transform(ResourceKind::Function, hostile_transform(payload.clone()))
            .with_transform(ResourceKind::TopicRule, hostile_transform(payload.clone()))
            .with_transform(ResourceKind::Permission, hostile_transform(payload.clone()));

        TopicSubscription::build("sub", config, &mut scope).unwrap();
        let [function_id, rule_id, permission_id] = child_ids("sub");

        // Function: the generated name survived.
        let function = scope.node(&function_id).unwrap().draft();
        prop_assert!(function.get("name").unwrap().as_literal().unwrap().starts_with("sub-handler-"));
        // The hook did run: unowned fields took the payload.
        prop_assert_eq!(function.get("handler").unwrap().as_literal(), Some(payload.as_str()));

        // Rule: the action target is still a deferred sourced from the function.
        let rule = scope.node(&rule_id).unwrap();
        let target = rule.draft().get("action_target").unwrap().as_deferred().unwrap();
        prop_assert!(target.deps().contains(&function_id.source_id()));
        prop_assert!(rule.depends_on_id(&function_id));
        prop_assert!(rule.draft().get("name").unwrap().as_literal().unwrap().starts_with("sub-rule-"));

        // Permission: every owned field kept its composite value.
        let permission = scope.node(&permission_id).unwrap();
        let source = permission.draft().get("source_arn").unwrap().as_deferred().unwrap();
        prop_assert!(source.deps().contains(&rule_id.source_id()));
        let callee = permission.draft().get("function_name").unwrap().as_deferred().unwrap();
        prop_assert!(callee.deps().contains(&function_id.source_id()));
        prop_assert_eq!(permission.draft().get("action").unwrap().as_literal(), Some("invoke:Function"));
        prop_assert_eq!(permission.draft().get("principal").unwrap().as_literal(), Some("topics.cirrus.internal"));
        prop_assert!(permission.depends_on_id(&rule_id));
    }
}

/// Field slots used by the dependency-union property.
const FIELDS: [&str; 5] = ["f0", "f1", "f2", "f3", "f4"];

proptest! {
    #[test]
    fn depends_on_is_exactly_implicit_union_explicit(
        implicit in proptest::collection::vec(any::<bool>(), 5),
        explicit in proptest::collection::vec(any::<bool>(), 5),
    ) {
        let engine = Arc::new(ManualEngine::new());
        let mut scope = Scope::new("app", engine.clone());

        let mut draft = Draft::new().with("name", "node");
        let mut expected = DepSet::new();

        for (index, picked) in implicit.iter().enumerate() {
            if *picked {
                let source = SourceId::new(format!("up/{index}"));
                expected.insert(source.clone());
                draft.set(
                    FIELDS[index],
                    Deferred::resolved("value".to_string()).with_source(source),
                );
            }
        }

        let mut explicit_deps = DepSet::new();
        for (index, picked) in explicit.iter().enumerate() {
            if *picked {
                let source = SourceId::new(format!("ext/{index}"));
                expected.insert(source.clone());
                explicit_deps.insert(source);
            }
        }

        scope
            .declare(
                ResourceKind::Function,
                ResourceId::new("app/node"),
                draft,
                explicit_deps,
            )
            .unwrap();

        let node = scope.node(&ResourceId::new("app/node")).unwrap();
        // Exact set equality: a superset with extras would fail too.
        prop_assert_eq!(node.depends_on(), &expected);
    }
}
