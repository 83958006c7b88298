//! Combinators that derive deferred values while merging dependency sets.
//!
//! Every combinator obeys the same law: the output's dependency set is the
//! union of the inputs' dependency sets. Dependency information is never
//! silently dropped, so any consumer of a derived value is transitively
//! ordered after every resource that contributed to it.
//!
//! Combinators never block the caller. Derived values settle through the
//! settle-callback mechanism of [`Deferred::on_settle`], and failures
//! (including cancellation) propagate to the derived value with the
//! originating source identity intact.
//!
//! # Example
//!
//! ```
//! use cirrus_value::{Deferred, SourceId, combine};
//!
//! let (arn, resolver) = Deferred::<String>::pending();
//! let arn = arn.with_source(SourceId::new("app/rule"));
//!
//! let statement = combine::interpolate("allow invoke from {}", &[arn]);
//! assert!(statement.deps().contains(&SourceId::new("app/rule")));
//!
//! resolver.resolve("arn:rule:ingest".to_string());
//! assert_eq!(
//!     statement.try_get(),
//!     Some(Ok("allow invoke from arn:rule:ingest".to_string())),
//! );
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::deferred::{Deferred, Resolver, Settled};
use crate::source::DepSet;

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Applies `f` to the eventual resolved value.
    ///
    /// The derived value carries this value's dependency set unchanged.
    /// Failure and cancellation propagate as-is.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let (out, resolver) = Deferred::pending();
        let out = out.with_deps(self.deps().clone());
        self.on_settle(move |outcome| match outcome {
            Ok(value) => resolver.resolve(f(value)),
            Err(error) => resolver.fail(error),
        });
        out
    }
}

/// Combines two deferred values into a deferred pair.
///
/// The pair settles once both inputs have resolved; its dependency set is
/// the union of both inputs' sets. The first input failure settles the pair
/// with that failure.
#[must_use]
pub fn zip<A, B>(a: &Deferred<A>, b: &Deferred<B>) -> Deferred<(A, B)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    let (out, resolver) = Deferred::pending();
    let mut deps = a.deps().clone();
    deps.union_with(b.deps());
    let out = out.with_deps(deps);

    let resolver = Arc::new(resolver);
    let slots = Arc::new(Mutex::new((None::<A>, None::<B>)));

    {
        let resolver = Arc::clone(&resolver);
        let slots = Arc::clone(&slots);
        a.on_settle(move |outcome| match outcome {
            Ok(value) => {
                let pair = {
                    let mut slots = slots.lock();
                    slots.0 = Some(value);
                    take_pair(&mut slots)
                };
                if let Some(pair) = pair {
                    resolver.resolve(pair);
                }
            }
            Err(error) => resolver.fail(error),
        });
    }
    b.on_settle(move |outcome| match outcome {
        Ok(value) => {
            let pair = {
                let mut slots = slots.lock();
                slots.1 = Some(value);
                take_pair(&mut slots)
            };
            if let Some(pair) = pair {
                resolver.resolve(pair);
            }
        }
        Err(error) => resolver.fail(error),
    });

    out
}

/// Takes both slots out once both are filled.
fn take_pair<A, B>(slots: &mut (Option<A>, Option<B>)) -> Option<(A, B)> {
    if slots.0.is_some() && slots.1.is_some() {
        Some((slots.0.take()?, slots.1.take()?))
    } else {
        None
    }
}

/// Aggregation state for [`interpolate`].
struct JoinSlots {
    slots: Vec<Option<String>>,
    remaining: usize,
}

/// Produces a string from `template` with each `{}` placeholder substituted
/// by the corresponding resolved part, in order.
///
/// The output's dependency set is the union of all parts' dependency sets,
/// recorded eagerly: a consumer of the interpolated string is ordered after
/// every resource that contributed a part, even for parts that are already
/// resolved when this is called.
///
/// Placeholders beyond the supplied parts are left verbatim. The first part
/// failure settles the output with that failure.
#[must_use]
pub fn interpolate(template: &str, parts: &[Deferred<String>]) -> Deferred<String> {
    if parts.is_empty() {
        return Deferred::resolved(template.to_string());
    }

    let (out, resolver) = Deferred::pending();
    let mut deps = DepSet::new();
    for part in parts {
        deps.union_with(part.deps());
    }
    let out = out.with_deps(deps);

    let resolver = Arc::new(resolver);
    let state = Arc::new(Mutex::new(JoinSlots {
        slots: vec![None; parts.len()],
        remaining: parts.len(),
    }));
    let template: Arc<str> = template.into();

    for (index, part) in parts.iter().enumerate() {
        let resolver: Arc<Resolver<String>> = Arc::clone(&resolver);
        let state = Arc::clone(&state);
        let template = Arc::clone(&template);
        part.on_settle(move |outcome: Settled<String>| match outcome {
            Ok(value) => {
                let rendered = {
                    let mut state = state.lock();
                    state.slots[index] = Some(value);
                    state.remaining -= 1;
                    if state.remaining == 0 {
                        let values: Vec<String> = state
                            .slots
                            .iter_mut()
                            .map(|slot| slot.take().unwrap_or_default())
                            .collect();
                        Some(render(&template, &values))
                    } else {
                        None
                    }
                };
                if let Some(rendered) = rendered {
                    resolver.resolve(rendered);
                }
            }
            Err(error) => resolver.fail(error),
        });
    }

    out
}

/// Substitutes `{}` placeholders in order; extras stay verbatim.
fn render(template: &str, values: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut index = 0;
    while let Some(position) = rest.find("{}") {
        if index >= values.len() {
            break;
        }
        out.push_str(&rest[..position]);
        out.push_str(&values[index]);
        index += 1;
        rest = &rest[position + 2..];
    }
    out.push_str(rest);
    out
}
