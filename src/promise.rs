//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::fmt;

use crate::deferred::{DeferredCell, PromiseId, PromiseState, Reaction, Reject, Resolve, Settled};
use crate::error::AggregateError;
use crate::scheduler::Scheduler;
use crate::thenable::{Resolution, Thenable};

// enable/disable output of modtrace! macro
const MODTRACE: bool = true;

/// A value that becomes available, or fails, later on the same thread.
///
/// The promise settles at most once. Reactions attached with [Promise::then()] and friends
/// always run from the scheduler, never inside the call that settled the promise or
/// attached the reaction, and in the order they were attached. Every chaining method
/// returns a new promise.
///
/// `Promise` is a handle: clones refer to the same promise and see the same settled value.
/// Each reaction receives its own clone of that value.
///
/// A rejection that nobody handles is silently swallowed. The runtime only reports it to
/// the unhandled rejection hook, see [`crate::RejectionHook`].
pub struct Promise<T, E> {
    cell: DeferredCell<T, E>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Promise {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// Creates a promise and runs the initializer right away with its resolving functions.
    ///
    /// An `Err` returned by the initializer rejects the promise, unless the initializer has
    /// already resolved it.
    pub fn new<S, InitF>(sched: &S, init: InitF) -> Self
    where
        S: AsRef<Scheduler> + ?Sized,
        InitF: FnOnce(Resolve<T, E>, Reject<T, E>) -> Result<(), E>,
    {
        let (promise, resolve, reject) = Self::pending(sched);
        if let Err(reason) = init(resolve, reject.clone()) {
            modtrace!("Promise: {:?} initializer failed", promise.id());
            reject.reject(reason);
        }
        promise
    }

    /// Creates a pending promise together with its resolving functions.
    pub fn pending<S>(sched: &S) -> (Self, Resolve<T, E>, Reject<T, E>)
    where
        S: AsRef<Scheduler> + ?Sized,
    {
        let cell = DeferredCell::new(sched.as_ref());
        let (resolve, reject) = cell.resolving_functions();
        (Promise { cell }, resolve, reject)
    }

    /// Creates a promise fulfilled with the value.
    pub fn resolve<S>(sched: &S, value: T) -> Self
    where
        S: AsRef<Scheduler> + ?Sized,
    {
        Self::resolve_with(sched, Resolution::Value(value))
    }

    /// Creates a promise resolved with a value or chasing a thenable.
    pub fn resolve_with<S>(sched: &S, resolution: Resolution<T, E>) -> Self
    where
        S: AsRef<Scheduler> + ?Sized,
    {
        let (promise, resolve, _) = Self::pending(sched);
        resolve.resolve(resolution);
        promise
    }

    /// Creates a promise that settles exactly like the thenable, and no earlier.
    pub fn chase<S, ThenableT>(sched: &S, thenable: ThenableT) -> Self
    where
        S: AsRef<Scheduler> + ?Sized,
        ThenableT: Thenable<T, E> + 'static,
    {
        Self::resolve_with(sched, Resolution::chase(thenable))
    }

    /// Creates a promise rejected with the reason.
    pub fn reject<S>(sched: &S, reason: E) -> Self
    where
        S: AsRef<Scheduler> + ?Sized,
    {
        let (promise, _, reject) = Self::pending(sched);
        reject.reject(reason);
        promise
    }

    pub fn id(&self) -> PromiseId {
        self.cell.id()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> PromiseState<T, E> {
        self.cell.snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.cell.scheduler()
    }

    /// The general form of chaining: one handler per outcome.
    ///
    /// `Ok` from a handler resolves the returned promise (a thenable is chased), `Err` rejects
    /// it. A rejection handler that returns `Ok` recovers the chain.
    pub fn then_with<U, OnFulfilledF, OnRejectedF>(
        &self,
        on_fulfilled: OnFulfilledF,
        on_rejected: OnRejectedF,
    ) -> Promise<U, E>
    where
        U: Clone + 'static,
        OnFulfilledF: FnOnce(T) -> Result<Resolution<U, E>, E> + 'static,
        OnRejectedF: FnOnce(E) -> Result<Resolution<U, E>, E> + 'static,
    {
        let (downstream, resolve, reject) = Promise::<U, E>::pending(self.scheduler());
        modtrace!("Promise: {:?} -> {:?}", self.id(), downstream.id());

        self.on_settled(move |outcome| {
            let handled = match outcome {
                Settled::Fulfilled(value) => on_fulfilled(value),
                Settled::Rejected(reason) => on_rejected(reason),
            };

            match handled {
                Ok(resolution) => resolve.resolve(resolution),
                Err(reason) => reject.reject(reason),
            }
        });

        downstream
    }

    /// Maps the fulfilled value; a rejection passes through unchanged.
    pub fn then<U, OnFulfilledF>(&self, on_fulfilled: OnFulfilledF) -> Promise<U, E>
    where
        U: Clone + 'static,
        OnFulfilledF: FnOnce(T) -> Result<U, E> + 'static,
    {
        self.then_with(
            move |value| on_fulfilled(value).map(Resolution::Value),
            |reason| Err(reason),
        )
    }

    /// Like [Promise::then()], but the handler may return another promise or thenable that
    /// the returned promise will wait for.
    pub fn and_then<U, OnFulfilledF>(&self, on_fulfilled: OnFulfilledF) -> Promise<U, E>
    where
        U: Clone + 'static,
        OnFulfilledF: FnOnce(T) -> Result<Resolution<U, E>, E> + 'static,
    {
        self.then_with(on_fulfilled, |reason| Err(reason))
    }

    /// Handles both outcomes.
    pub fn then_or<U, OnFulfilledF, OnRejectedF>(
        &self,
        on_fulfilled: OnFulfilledF,
        on_rejected: OnRejectedF,
    ) -> Promise<U, E>
    where
        U: Clone + 'static,
        OnFulfilledF: FnOnce(T) -> Result<U, E> + 'static,
        OnRejectedF: FnOnce(E) -> Result<U, E> + 'static,
    {
        self.then_with(
            move |value| on_fulfilled(value).map(Resolution::Value),
            move |reason| on_rejected(reason).map(Resolution::Value),
        )
    }

    /// Handles a rejection; a fulfilled value passes through unchanged.
    pub fn catch<OnRejectedF>(&self, on_rejected: OnRejectedF) -> Promise<T, E>
    where
        OnRejectedF: FnOnce(E) -> Result<T, E> + 'static,
    {
        self.then_with(
            |value| Ok(Resolution::Value(value)),
            move |reason| on_rejected(reason).map(Resolution::Value),
        )
    }

    /// Like [Promise::catch()], but the handler may return another promise or thenable.
    pub fn or_else<OnRejectedF>(&self, on_rejected: OnRejectedF) -> Promise<T, E>
    where
        OnRejectedF: FnOnce(E) -> Result<Resolution<T, E>, E> + 'static,
    {
        self.then_with(|value| Ok(Resolution::Value(value)), on_rejected)
    }

    /// Runs the callback on either outcome and passes the outcome through. An `Err` from the
    /// callback replaces the outcome with that rejection.
    pub fn finally<OnSettledF>(&self, on_settled: OnSettledF) -> Promise<T, E>
    where
        OnSettledF: FnOnce() -> Result<(), E> + 'static,
    {
        let (downstream, resolve, reject) = Self::pending(self.scheduler());

        self.on_settled(move |outcome| match on_settled() {
            Err(reason) => reject.reject(reason),
            Ok(()) => match outcome {
                Settled::Fulfilled(value) => resolve.fulfill(value),
                Settled::Rejected(reason) => reject.reject(reason),
            },
        });

        downstream
    }

    /// Waits for every item, see [all()](crate::all).
    pub fn all<S, I>(sched: &S, items: I) -> Promise<Vec<T>, E>
    where
        S: AsRef<Scheduler> + ?Sized,
        I: IntoIterator,
        I::Item: Into<Resolution<T, E>>,
    {
        crate::join::all(sched, items)
    }

    /// Waits for every item to settle, see [all_settled()](crate::all_settled).
    pub fn all_settled<S, I>(sched: &S, items: I) -> Promise<Vec<Settled<T, E>>, E>
    where
        S: AsRef<Scheduler> + ?Sized,
        I: IntoIterator,
        I::Item: Into<Resolution<T, E>>,
    {
        crate::join::all_settled(sched, items)
    }

    /// Settles like the first item to settle, see [race()](crate::race).
    pub fn race<S, I>(sched: &S, items: I) -> Promise<T, E>
    where
        S: AsRef<Scheduler> + ?Sized,
        I: IntoIterator,
        I::Item: Into<Resolution<T, E>>,
    {
        crate::race::race(sched, items)
    }

    /// Fulfills like the first item to fulfill, see [any()](crate::any).
    pub fn any<S, I>(sched: &S, items: I) -> Promise<T, AggregateError<E>>
    where
        S: AsRef<Scheduler> + ?Sized,
        I: IntoIterator,
        I::Item: Into<Resolution<T, E>>,
    {
        crate::race::any(sched, items)
    }

    // Registers a raw reaction, without creating a downstream promise.
    pub(crate) fn on_settled<ReactF>(&self, react: ReactF)
    where
        ReactF: FnOnce(Settled<T, E>) + 'static,
    {
        self.cell.register(Reaction::new(react));
    }
}

impl<T, E> Thenable<T, E> for Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    fn then_settle(self: Box<Self>, resolve: Resolve<T, E>, reject: Reject<T, E>)
        -> Result<(), E>
    {
        self.on_settled(move |outcome| match outcome {
            Settled::Fulfilled(value) => resolve.fulfill(value),
            Settled::Rejected(reason) => reject.reject(reason),
        });
        Ok(())
    }

    fn promise_id(&self) -> Option<PromiseId> {
        Some(self.id())
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Promise").field("id", &self.cell.id()).finish()
    }
}
