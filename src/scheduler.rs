//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::deferred::PromiseId;
use crate::unhandled::{RejectionHook, UnhandledRejection};

// enable/disable output of modtrace! macro
const MODTRACE: bool = false;

/// A unit of work in the microtask queue: typically "run this reaction with that outcome".
pub type Microtask = Box<dyn FnOnce()>;

/// The FIFO microtask queue that all promises of a runtime share.
///
/// Settling a promise never runs its reactions, it only enqueues them here. The queue is
/// drained by the [`crate::Runtime`] event loop, or by hand with [`Scheduler::drain()`]
/// when a test wants deterministic control without any timers.
///
/// Unhandled rejections are kept until [`Scheduler::report_unhandled()`] is invoked. The
/// runtime does it after every drain, a scheduler drained by hand has to do it as well or
/// the list keeps growing.
///
/// Scheduler is a cheap handle: clones refer to the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
    queue: RefCell<VecDeque<Microtask>>,
    draining: Cell<bool>,
    total_enqueued: Cell<u64>,
    // rejected promises without reactions, in the order of rejection
    unhandled: RefCell<Vec<UnhandledRejection>>,
    hook: RejectionHook,
}

// Resets the draining flag even if a task panics.
struct DrainGuard<'a>(&'a Cell<bool>);

impl<'a> Drop for DrainGuard<'a> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_hook(RejectionHook::new_empty())
    }

    /// Creates a scheduler that reports unhandled rejections to the given hook.
    pub fn with_hook(hook: RejectionHook) -> Self {
        Scheduler {
            inner: Rc::new(SchedulerInner {
                queue: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
                total_enqueued: Cell::new(0),
                unhandled: RefCell::new(Vec::new()),
                hook,
            }),
        }
    }

    /// Appends the task to the end of the queue.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.inner.queue.borrow_mut().push_back(Box::new(task));
        let total = self.inner.total_enqueued.get() + 1;
        self.inner.total_enqueued.set(total);
        modtrace!("Scheduler: enqueued task #{}", total);
    }

    /// Runs tasks in FIFO order until the queue is empty and returns how many ran.
    ///
    /// Tasks enqueued by a running task are run by the same drain, after everything that was
    /// already queued. Invoking drain() from inside a task does nothing and returns 0: a task
    /// always runs to completion before the next one starts.
    pub fn drain(&self) -> usize {
        if self.inner.draining.replace(true) {
            modtrace!("Scheduler: nested drain ignored");
            return 0;
        }
        let _guard = DrainGuard(&self.inner.draining);

        let mut ran = 0;
        loop {
            // The queue must not be borrowed while the task runs, it may enqueue more.
            let task = self.inner.queue.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }

        modtrace!("Scheduler: drained {} tasks", ran);
        ran
    }

    /// Number of tasks waiting in the queue.
    pub fn pending_count(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_count() == 0
    }

    /// Number of tasks ever enqueued.
    pub fn total_enqueued(&self) -> u64 {
        self.inner.total_enqueued.get()
    }

    /// Reports every rejection that is still unhandled to the hook and forgets them.
    ///
    /// The runtime invokes this after each microtask drain. A rejection is unhandled if no
    /// reaction was attached to its promise by that moment. Returns the number of reports.
    ///
    /// Nothing is borrowed while the hook runs. Rejections that happen inside the hook are
    /// kept for the next report.
    pub fn report_unhandled(&self) -> usize {
        let reports = std::mem::replace(&mut *self.inner.unhandled.borrow_mut(), Vec::new());
        for rejection in reports.iter() {
            self.inner.hook.report(rejection);
        }
        reports.len()
    }

    /// Number of rejections waiting for [`Scheduler::report_unhandled()`].
    pub fn unhandled_count(&self) -> usize {
        self.inner.unhandled.borrow().len()
    }

    pub(crate) fn track_rejection(&self, promise_id: PromiseId, reason: String) {
        modtrace!("Scheduler: tracking unhandled rejection of {:?}", promise_id);
        self.inner
            .unhandled
            .borrow_mut()
            .push(UnhandledRejection { promise_id, reason });
    }

    pub(crate) fn untrack_rejection(&self, promise_id: PromiseId) {
        self.inner
            .unhandled
            .borrow_mut()
            .retain(|rejection| rejection.promise_id != promise_id);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Scheduler> for Scheduler {
    fn as_ref(&self) -> &Scheduler {
        self
    }
}
