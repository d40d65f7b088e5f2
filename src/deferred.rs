//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::scheduler::Scheduler;
use crate::thenable::Resolution;

// enable/disable output of modtrace! macro
const MODTRACE: bool = true;

/// Identity of a promise: clones of a [`crate::Promise`] handle share it, every `then()`
/// produces a new one.
///
/// Ids are unique within the process, whatever scheduler the promise belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct PromiseId(u64);

static LAST_PROMISE_ID: AtomicU64 = AtomicU64::new(0);

impl PromiseId {
    pub(crate) fn next() -> Self {
        PromiseId(LAST_PROMISE_ID.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// A snapshot of a promise state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromiseState<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> PromiseState<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, PromiseState::Pending)
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, PromiseState::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, PromiseState::Rejected(_))
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// `None` while pending, otherwise the outcome as a `Result`.
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(value) => Some(Ok(value)),
            PromiseState::Rejected(reason) => Some(Err(reason)),
        }
    }
}

/// The outcome of a settled promise, as handed to reactions and reported by
/// [all_settled()](crate::all_settled).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settled<T, E> {
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> Settled<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settled::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settled::Rejected(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settled::Fulfilled(value) => Ok(value),
            Settled::Rejected(reason) => Err(reason),
        }
    }
}

impl<T, E> From<Settled<T, E>> for PromiseState<T, E> {
    fn from(settled: Settled<T, E>) -> Self {
        match settled {
            Settled::Fulfilled(value) => PromiseState::Fulfilled(value),
            Settled::Rejected(reason) => PromiseState::Rejected(reason),
        }
    }
}

// A callback registered on a cell. It captures its handlers together with the downstream
// promise and is invoked exactly once with the outcome, always from the scheduler.
pub(crate) struct Reaction<T, E>(Box<dyn FnOnce(Settled<T, E>)>);

impl<T, E> Reaction<T, E> {
    pub(crate) fn new<F>(react: F) -> Self
    where
        F: FnOnce(Settled<T, E>) + 'static,
    {
        Reaction(Box::new(react))
    }

    fn run(self, outcome: Settled<T, E>) {
        (self.0)(outcome)
    }
}

// Possible states of the cell. Reactions only exist while pending.
enum State<T, E> {
    Pending(Vec<Reaction<T, E>>),
    Fulfilled(T),
    Rejected(E),
}

struct CellInner<T, E> {
    id: PromiseId,
    state: State<T, E>,
    // a reaction was registered at least once, so rejection is not "unhandled"
    handled: bool,
}

/// The settle-once state holder behind a promise.
///
/// The cell is only mutated by its own settlement. Reactions never run while the cell is
/// borrowed: settlement moves them to the scheduler.
pub(crate) struct DeferredCell<T, E> {
    inner: Rc<RefCell<CellInner<T, E>>>,
    sched: Scheduler,
}

impl<T, E> Clone for DeferredCell<T, E> {
    fn clone(&self) -> Self {
        DeferredCell {
            inner: self.inner.clone(),
            sched: self.sched.clone(),
        }
    }
}

impl<T, E> DeferredCell<T, E> {
    pub(crate) fn id(&self) -> PromiseId {
        self.inner.borrow().id
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.sched
    }
}

impl<T, E> DeferredCell<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    pub(crate) fn new(sched: &Scheduler) -> Self {
        let id = PromiseId::next();
        modtrace!("DeferredCell: {:?} created", id);

        DeferredCell {
            inner: Rc::new(RefCell::new(CellInner {
                id,
                state: State::Pending(Vec::new()),
                handled: false,
            })),
            sched: sched.clone(),
        }
    }

    pub(crate) fn snapshot(&self) -> PromiseState<T, E> {
        match self.inner.borrow().state {
            State::Pending(_) => PromiseState::Pending,
            State::Fulfilled(ref value) => PromiseState::Fulfilled(value.clone()),
            State::Rejected(ref reason) => PromiseState::Rejected(reason.clone()),
        }
    }

    /// Transitions to Fulfilled, no-op if already settled.
    pub(crate) fn fulfill(&self, value: T) {
        self.settle(Settled::Fulfilled(value));
    }

    /// Transitions to Rejected, no-op if already settled. The reason is taken literally.
    pub(crate) fn reject(&self, reason: E) {
        self.settle(Settled::Rejected(reason));
    }

    fn settle(&self, outcome: Settled<T, E>) {
        let (id, handled, reactions) = {
            let mut inner = self.inner.borrow_mut();
            let reactions = match inner.state {
                State::Pending(ref mut reactions) => std::mem::replace(reactions, Vec::new()),
                _ => {
                    modtrace!("DeferredCell: {:?} already settled, ignored", inner.id);
                    return;
                }
            };

            inner.state = match outcome {
                Settled::Fulfilled(ref value) => State::Fulfilled(value.clone()),
                Settled::Rejected(ref reason) => State::Rejected(reason.clone()),
            };
            (inner.id, inner.handled, reactions)
        };

        modtrace!(
            "DeferredCell: {:?} settled (fulfilled: {}), {} reactions",
            id,
            outcome.is_fulfilled(),
            reactions.len()
        );

        if let Settled::Rejected(ref reason) = outcome {
            if !handled {
                self.sched.track_rejection(id, format!("{:?}", reason));
            }
        }

        for reaction in reactions {
            let outcome = outcome.clone();
            self.sched.enqueue(move || reaction.run(outcome));
        }
    }

    /// Registers the reaction. On a settled cell the reaction is enqueued right away, it
    /// still never runs inside this call.
    pub(crate) fn register(&self, reaction: Reaction<T, E>) {
        let (id, was_handled, outcome) = {
            let mut inner = self.inner.borrow_mut();
            let was_handled = std::mem::replace(&mut inner.handled, true);
            let outcome = match inner.state {
                State::Pending(ref mut reactions) => {
                    reactions.push(reaction);
                    return;
                }
                State::Fulfilled(ref value) => Settled::Fulfilled(value.clone()),
                State::Rejected(ref reason) => Settled::Rejected(reason.clone()),
            };
            (inner.id, was_handled, outcome)
        };

        if !was_handled && outcome.is_rejected() {
            // a late handler: the rejection is observed after all
            self.sched.untrack_rejection(id);
        }

        self.sched.enqueue(move || reaction.run(outcome));
    }

    /// Creates a fresh pair of resolving functions bound to this cell.
    pub(crate) fn resolving_functions(&self) -> (Resolve<T, E>, Reject<T, E>) {
        let shared = Rc::new(ResolvingState {
            cell: self.clone(),
            already_resolved: Cell::new(false),
        });

        (
            Resolve {
                shared: shared.clone(),
            },
            Reject { shared },
        )
    }

    // Resolution logic shared by all resolving functions of this cell: plain values fulfill,
    // thenables are chased in a separate microtask.
    fn resolve_with(&self, resolution: Resolution<T, E>) {
        match resolution {
            Resolution::Value(value) => self.fulfill(value),
            Resolution::Thenable(thenable) => {
                let id = self.id();
                if thenable.promise_id() == Some(id) {
                    tracing::warn!(promise = ?id, "promise resolved with itself, it will never settle");
                    return;
                }

                modtrace!("DeferredCell: {:?} chases a thenable", id);
                let cell = self.clone();
                self.sched.enqueue(move || {
                    let (resolve, reject) = cell.resolving_functions();
                    if let Err(reason) = thenable.then_settle(resolve, reject.clone()) {
                        reject.reject(reason);
                    }
                });
            }
        }
    }
}

struct ResolvingState<T, E> {
    cell: DeferredCell<T, E>,
    already_resolved: Cell<bool>,
}

/// The capability to resolve a promise, handed to [`crate::Promise::new()`] initializers and
/// to [`crate::Thenable::then_settle()`].
///
/// A `Resolve` and its `Reject` twin share one flag: whichever is called first wins, all
/// later calls of either are ignored.
pub struct Resolve<T, E> {
    shared: Rc<ResolvingState<T, E>>,
}

/// The capability to reject a promise, twin of [Resolve].
pub struct Reject<T, E> {
    shared: Rc<ResolvingState<T, E>>,
}

impl<T, E> Clone for Resolve<T, E> {
    fn clone(&self) -> Self {
        Resolve {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Reject {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> Resolve<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// Fulfills the promise with the value.
    pub fn fulfill(&self, value: T) {
        self.resolve(Resolution::Value(value));
    }

    /// Resolves the promise: a value fulfills it, a thenable is chased and the promise
    /// adopts its outcome once it settles.
    pub fn resolve(&self, resolution: Resolution<T, E>) {
        if self.shared.already_resolved.replace(true) {
            modtrace!("Resolve: {:?} already resolved, ignored", self.shared.cell.id());
            return;
        }
        self.shared.cell.resolve_with(resolution);
    }

    /// True once either resolving function of the pair was called.
    pub fn is_resolved(&self) -> bool {
        self.shared.already_resolved.get()
    }
}

impl<T, E> Reject<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    /// Rejects the promise with the reason. A thenable reason is not chased.
    pub fn reject(&self, reason: E) {
        if self.shared.already_resolved.replace(true) {
            modtrace!("Reject: {:?} already resolved, ignored", self.shared.cell.id());
            return;
        }
        self.shared.cell.reject(reason);
    }

    /// True once either resolving function of the pair was called.
    pub fn is_resolved(&self) -> bool {
        self.shared.already_resolved.get()
    }
}
