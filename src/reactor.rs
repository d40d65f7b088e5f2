//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::time::Duration;

use crate::error::TimerError;

/// A callback the reactor hands back to the runtime when its event is due.
///
/// Macrotasks run one per timer phase, the microtask queue is always drained in between.
pub type Macrotask = Box<dyn FnOnce()>;

/// Reactor API for the Runtime.
///
/// External crate implements the trait to create a Runtime with both microtask scheduler
/// and some source of external events.
pub trait Reactor {
    /// Waits for the next event to happen and returns its callback. Returns `None` when
    /// there is nothing to wait for, which is how the runtime knows it became idle.
    fn wait(&self) -> Option<Macrotask>;
}

/// Reactor with a very basic timers.
pub trait TemporalReactor: Reactor {
    /// Timer API has a limit about its max duration (24 hour).
    const MAX_TIMER_DURATION_MS: u32 = 24 * 60 * 60 * 1000;

    fn schedule_timer(&self, duration: Duration, callback: Macrotask)
        -> Result<TimerId, TimerError>;
    fn cancel_timer(&self, timer_id: TimerId) -> Result<(), TimerError>;
}

/// TimerId is a reactor's id for the scheduled timer.
///
/// Ids are never reused by the same reactor, so cancelling a timer that has already
/// fired is reported as an unknown timer rather than hitting some other timer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TimerId(pub(crate) u64);

impl TimerId {
    pub fn null() -> Self {
        TimerId(0)
    }
}
