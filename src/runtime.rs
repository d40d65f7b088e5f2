//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::fmt;
use std::time::Duration;

use crate::deferred::PromiseState;
use crate::error::TimerError;
use crate::promise::Promise;
use crate::reactor::{Reactor, TemporalReactor, TimerId};
use crate::scheduler::Scheduler;
use crate::unhandled::{RejectionHook, UnhandledRejection};

// enable/disable output of modtrace! macro
const MODTRACE: bool = true;

/// The owner of the reactor (source of external events such as timers) and the microtask
/// scheduler that all promises of this runtime share.
///
/// The event loop alternates two phases: the microtask phase drains the scheduler until it
/// is empty, then the timer phase waits for one event of the reactor and runs its callback.
/// The loop is over when both have nothing to do.
pub struct Runtime<ReactorT> {
    reactor: ReactorT,
    scheduler: Scheduler,
}

/// Runtime configuration.
pub struct Builder<ReactorT> {
    reactor: ReactorT,
    hook: RejectionHook,
}

impl<ReactorT> Builder<ReactorT>
where
    ReactorT: Reactor,
{
    pub fn new(reactor: ReactorT) -> Self {
        Builder {
            reactor,
            hook: RejectionHook::new_empty(),
        }
    }

    /// Sets the callback invoked for every rejection that nobody handled by the end of a
    /// microtask phase. It does not change the outcome of anything.
    pub fn unhandled_rejection_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&UnhandledRejection) + 'static,
    {
        self.hook = RejectionHook::new(hook);
        self
    }

    pub fn build(self) -> Runtime<ReactorT> {
        Runtime {
            reactor: self.reactor,
            scheduler: Scheduler::with_hook(self.hook),
        }
    }
}

impl<ReactorT> Runtime<ReactorT>
where
    ReactorT: Reactor,
{
    pub fn new(reactor: ReactorT) -> Self {
        Builder::new(reactor).build()
    }

    pub fn builder(reactor: ReactorT) -> Builder<ReactorT> {
        Builder::new(reactor)
    }

    /// Returns the microtask scheduler of this runtime.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns reference to reactor.
    pub fn io(&self) -> &ReactorT {
        &self.reactor
    }

    /// Runs the event loop until there are no microtasks and no reactor events left.
    pub fn run(&self) {
        while self.turn() {}
        modtrace!("Rt: idle, {} microtasks total", self.scheduler.total_enqueued());
    }

    /// Makes a single turn of the event loop: the microtask phase and then one reactor event.
    /// Returns false if the runtime became idle.
    pub fn turn(&self) -> bool {
        self.microtask_phase();
        self.timer_phase()
    }

    /// Runs the event loop until the promise settles and returns its state. If the runtime
    /// becomes idle first, the promise can never settle and `Pending` is returned.
    pub fn block_on<T, E>(&self, promise: &Promise<T, E>) -> PromiseState<T, E>
    where
        T: Clone + 'static,
        E: Clone + fmt::Debug + 'static,
    {
        loop {
            self.microtask_phase();
            if !promise.is_pending() || !self.timer_phase() {
                break;
            }
        }

        promise.state()
    }

    fn microtask_phase(&self) {
        let ran = self.scheduler.drain();
        let unhandled = self.scheduler.report_unhandled();
        modtrace!("Rt: microtask phase ran {} tasks, {} unhandled", ran, unhandled);
    }

    fn timer_phase(&self) -> bool {
        match self.reactor.wait() {
            Some(macrotask) => {
                modtrace!("Rt: timer phase");
                macrotask();
                true
            }
            None => {
                modtrace!("Rt: timer phase - nothing to wait");
                false
            }
        }
    }
}

impl<ReactorT> Runtime<ReactorT>
where
    ReactorT: TemporalReactor,
{
    /// Runs the callback in a timer phase after the duration passes. Callbacks due at the
    /// same moment run in the order they were scheduled.
    pub fn set_timeout<F>(&self, duration: Duration, callback: F) -> Result<TimerId, TimerError>
    where
        F: FnOnce() + 'static,
    {
        self.reactor.schedule_timer(duration, Box::new(callback))
    }

    /// Cancels a timer that has not fired yet.
    pub fn clear_timeout(&self, timer_id: TimerId) -> Result<(), TimerError> {
        self.reactor.cancel_timer(timer_id)
    }
}

impl<ReactorT> AsRef<Scheduler> for Runtime<ReactorT> {
    fn as_ref(&self) -> &Scheduler {
        &self.scheduler
    }
}
