//! The deferred value cell and its completion handle.
//!
//! A [`Deferred`] wraps a value that only becomes known after an
//! asynchronous provisioning step completes. It carries a [`DepSet`] naming
//! the upstream resources that contribute to it, and settles into exactly
//! one of three terminal states: resolved, failed, or cancelled.
//!
//! The provisioning side completes a deferred through its [`Resolver`];
//! consumers either `.await` the deferred (it implements [`Future`]),
//! inspect it with [`Deferred::try_get`], or attach a settle callback.
//!
//! # Example
//!
//! ```
//! use cirrus_value::Deferred;
//!
//! let (value, resolver) = Deferred::<String>::pending();
//! assert!(value.try_get().is_none());
//!
//! resolver.resolve("arn:rule:ingest".to_string());
//! assert_eq!(value.try_get(), Some(Ok("arn:rule:ingest".to_string())));
//!
//! // Settling is terminal; later attempts are ignored.
//! resolver.cancel();
//! assert_eq!(value.try_get(), Some(Ok("arn:rule:ingest".to_string())));
//! ```

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::source::{DepSet, SourceId};

/// Terminal failure of a deferred value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The named upstream resource failed to provision. The failure
    /// propagates to every downstream consumer with the originating source
    /// intact, so errors surfaced far from the failure still identify it.
    Failed {
        /// Identity of the resource that failed.
        source: SourceId,
        /// Engine-reported reason for the failure.
        reason: String,
    },

    /// The owning scope was torn down before the value resolved. This is a
    /// terminal state, never "still pending".
    Cancelled,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Failed { source, reason } => {
                write!(
                    f,
                    "upstream resource '{source}' failed to provision: {reason}"
                )
            }
            ResolveError::Cancelled => write!(f, "value cancelled before resolution"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// The outcome of a settled deferred value.
pub type Settled<T> = Result<T, ResolveError>;

/// Callback invoked exactly once when a deferred settles.
type SettleFn<T> = Box<dyn FnOnce(Settled<T>) + Send>;

/// Internal cell state. A settled state is terminal.
enum State<T> {
    Pending {
        wakers: Vec<Waker>,
        callbacks: Vec<SettleFn<T>>,
    },
    Resolved(T),
    Failed(ResolveError),
    Cancelled,
}

impl<T> State<T> {
    fn tag(&self) -> &'static str {
        match self {
            State::Pending { .. } => "pending",
            State::Resolved(_) => "resolved",
            State::Failed(_) => "failed",
            State::Cancelled => "cancelled",
        }
    }
}

/// Shared cell between a [`Deferred`] and its [`Resolver`].
struct Cell<T> {
    state: Mutex<State<T>>,
}

impl<T: Clone> Cell<T> {
    /// Transitions a pending cell into `next`, waking waiters and running
    /// settle callbacks. No-op if the cell already settled.
    fn settle(&self, next: State<T>) {
        let (wakers, callbacks, outcome) = {
            let mut state = self.state.lock();
            let State::Pending { wakers, callbacks } = &mut *state else {
                return;
            };
            let wakers = core::mem::take(wakers);
            let callbacks = core::mem::take(callbacks);
            *state = next;
            let outcome = match &*state {
                State::Resolved(v) => Ok(v.clone()),
                State::Failed(e) => Err(e.clone()),
                State::Cancelled => Err(ResolveError::Cancelled),
                // `next` is never pending; see the callers below.
                State::Pending { .. } => return,
            };
            (wakers, callbacks, outcome)
        };
        for waker in wakers {
            waker.wake();
        }
        for callback in callbacks {
            callback(outcome.clone());
        }
    }

    fn snapshot(&self) -> Option<Settled<T>> {
        match &*self.state.lock() {
            State::Pending { .. } => None,
            State::Resolved(v) => Some(Ok(v.clone())),
            State::Failed(e) => Some(Err(e.clone())),
            State::Cancelled => Some(Err(ResolveError::Cancelled)),
        }
    }
}

/// An asynchronously resolved value carrying its upstream dependency set.
///
/// Cloning a `Deferred` is cheap and shares the underlying cell: every
/// clone observes the same settlement. The dependency set, by contrast, is
/// per-handle, so [`Deferred::with_source`] can widen the recorded
/// dependencies of one consumer without affecting others.
pub struct Deferred<T> {
    cell: Arc<Cell<T>>,
    deps: DepSet,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            deps: self.deps.clone(),
        }
    }
}

impl<T> Deferred<T> {
    /// Returns the set of upstream sources this value depends on.
    #[must_use]
    pub fn deps(&self) -> &DepSet {
        &self.deps
    }

    /// Records an additional upstream source on this handle.
    ///
    /// Dependencies are unioned, never replaced.
    #[must_use]
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.deps.insert(source);
        self
    }

    /// Merges an entire dependency set into this handle.
    #[must_use]
    pub fn with_deps(mut self, deps: DepSet) -> Self {
        self.deps.union_with(&deps);
        self
    }

    /// Returns `true` if the value has not settled yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(&*self.cell.state.lock(), State::Pending { .. })
    }

    /// Returns `true` if the value has settled (resolved, failed, or
    /// cancelled).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Creates a deferred that is already resolved with `value`.
    ///
    /// This is the lift operation for plain values; lifting an existing
    /// `Deferred` is simply a clone, which keeps its dependency set.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self {
            cell: Arc::new(Cell {
                state: Mutex::new(State::Resolved(value)),
            }),
            deps: DepSet::new(),
        }
    }

    /// Creates a deferred that has already failed with `error`.
    #[must_use]
    pub fn failed(error: ResolveError) -> Self {
        Self {
            cell: Arc::new(Cell {
                state: Mutex::new(State::Failed(error)),
            }),
            deps: DepSet::new(),
        }
    }

    /// Creates a pending deferred together with its completion handle.
    ///
    /// Dropping the [`Resolver`] without settling leaves the value pending;
    /// the owning scope converts pending values into cancelled ones during
    /// teardown.
    #[must_use]
    pub fn pending() -> (Self, Resolver<T>) {
        let cell = Arc::new(Cell {
            state: Mutex::new(State::Pending {
                wakers: Vec::new(),
                callbacks: Vec::new(),
            }),
        });
        let deferred = Self {
            cell: Arc::clone(&cell),
            deps: DepSet::new(),
        };
        (deferred, Resolver { cell })
    }

    /// Returns a snapshot of the settled outcome without blocking.
    ///
    /// Returns `None` while the value is still pending.
    #[must_use]
    pub fn try_get(&self) -> Option<Settled<T>> {
        self.cell.snapshot()
    }

    /// Settles the value as cancelled if it is still pending.
    ///
    /// This is the owner-side teardown path: once the scope that declared
    /// the source resource is destroyed, every consumer must observe a
    /// terminal state rather than hang. No-op once settled.
    pub fn cancel(&self) {
        self.cell.settle(State::Cancelled);
    }

    /// Registers a callback invoked exactly once when the value settles.
    ///
    /// If the value already settled, the callback runs immediately on the
    /// calling thread. This is the composition primitive used by the
    /// combinators in [`crate::combine`]; it never blocks.
    pub fn on_settle(&self, callback: impl FnOnce(Settled<T>) + Send + 'static) {
        let outcome = {
            let mut state = self.cell.state.lock();
            match &mut *state {
                State::Pending { callbacks, .. } => {
                    callbacks.push(Box::new(callback));
                    return;
                }
                State::Resolved(v) => Ok(v.clone()),
                State::Failed(e) => Err(e.clone()),
                State::Cancelled => Err(ResolveError::Cancelled),
            }
        };
        callback(outcome);
    }
}

impl<T: Clone + Send + 'static> Future for Deferred<T> {
    type Output = Settled<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.cell.state.lock();
        match &mut *state {
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
            State::Resolved(v) => Poll::Ready(Ok(v.clone())),
            State::Failed(e) => Poll::Ready(Err(e.clone())),
            State::Cancelled => Poll::Ready(Err(ResolveError::Cancelled)),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self
            .cell
            .state
            .try_lock()
            .map_or("locked", |state| state.tag());
        f.debug_struct("Deferred")
            .field("state", &tag)
            .field("deps", &self.deps.len())
            .finish()
    }
}

/// Completion handle for a pending [`Deferred`].
///
/// Held by the provisioning side. The first of [`resolve`](Resolver::resolve),
/// [`fail`](Resolver::fail), or [`cancel`](Resolver::cancel) wins; later
/// calls are ignored.
pub struct Resolver<T> {
    cell: Arc<Cell<T>>,
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Settles the value with a successful result.
    pub fn resolve(&self, value: T) {
        self.cell.settle(State::Resolved(value));
    }

    /// Settles the value with a provisioning failure.
    pub fn fail(&self, error: ResolveError) {
        // A propagated cancellation stays a cancellation.
        match error {
            ResolveError::Cancelled => self.cell.settle(State::Cancelled),
            other => self.cell.settle(State::Failed(other)),
        }
    }

    /// Settles the value as cancelled.
    pub fn cancel(&self) {
        self.cell.settle(State::Cancelled);
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self
            .cell
            .state
            .try_lock()
            .map_or("locked", |state| state.tag());
        f.debug_struct("Resolver").field("state", &tag).finish()
    }
}
