//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

use crate::error::TimerError;
use crate::reactor::{Macrotask, Reactor, TemporalReactor, TimerId};

// enable/disable output of modtrace! macro
const MODTRACE: bool = true;

/// ToyReactor comes with a init parameter called SleepMode. To improve development and testing
/// cycles sleep can work in Emulated mode when it does not actually sleep.
#[derive(Copy, Clone, Debug)]
pub enum SleepMode {
    Actual,   // Makes actual delays, e.g. a 5s timer actually waits 5 sec before firing
    Emulated, // Does not wait, shoot timer right away in a relative sorted order
}

/// ToyReactor is reactor that can only schedule timers.
///
/// It is used for testing promises as a lot of I/O can be emulated just by a timer
/// (by pretending that we are reading something from network).
pub struct ToyReactor {
    // Reactor is a part of Runtime which is only allowed to work as non-unique ref, so
    // we have to make it with interior mutability.
    rimpl: RefCell<ToyReactorImpl>,
}

// The impl of reactor is more about forwarding to a method with &mut self.
// Toy reactor expired in 49 days and you have to re-launch it.
impl ToyReactor {
    /// Creates ToyReactor with actual sleep mode that would invoke [std::thread::sleep]().
    pub fn new() -> Self {
        Self::new_with_mode(SleepMode::Actual)
    }

    /// Creates ToyReactor with sleep mode provided as a parameter.
    pub fn new_with_mode(mode: SleepMode) -> Self {
        ToyReactor {
            rimpl: RefCell::new(ToyReactorImpl::new(mode)),
        }
    }

    /// Returns a monotonically increasing current time in milliseconds. It can be used
    /// for testing to verify if the time of a timer actually passes. In emulated sleep
    /// mode the value this function returns is also emulated.
    pub fn now32(&self) -> u32 {
        self.rimpl.borrow().now32()
    }

    /// Number of timers that are scheduled and not cancelled yet.
    pub fn scheduled_timers(&self) -> usize {
        self.rimpl.borrow().live.len()
    }
}

impl Default for ToyReactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor for ToyReactor {
    fn wait(&self) -> Option<Macrotask> {
        // The borrow is released before the callback is returned: timer callbacks are
        // free to schedule more timers.
        self.rimpl.borrow_mut().wait()
    }
}

impl TemporalReactor for ToyReactor {
    fn schedule_timer(
        &self,
        duration: Duration,
        callback: Macrotask,
    ) -> Result<TimerId, TimerError> {
        self.rimpl.borrow_mut().schedule_timer(duration, callback)
    }

    fn cancel_timer(&self, timer_id: TimerId) -> Result<(), TimerError> {
        self.rimpl.borrow_mut().cancel_timer(timer_id)
    }
}

// This is the data struct that describes a scheduled timer in our toy reactor.
struct TimerNode {
    wake_on: u32,
    timer_id: TimerId,
    callback: Macrotask,
}

impl TimerNode {
    fn new(now32: u32, duration_ms: u32, timer_id: TimerId, callback: Macrotask) -> Self {
        TimerNode {
            wake_on: now32 + duration_ms,
            timer_id,
            callback,
        }
    }

    // Ensure that timer duration is no longer then MAX_TIMER_DURATION_MS (24h)
    fn get_duration_u32(duration: Duration) -> Result<u32, TimerError> {
        let duration: u128 = duration.as_millis();

        if duration > ToyReactor::MAX_TIMER_DURATION_MS as u128 {
            return Err(TimerError::DurationTooLong {
                requested_ms: duration,
                max_ms: ToyReactor::MAX_TIMER_DURATION_MS,
            });
        }

        Ok(duration as u32)
    }
}

// Ordering for TimerNode to work with binary heap (reversed). Timers with the same wake
// time fire in the order they were scheduled, ids grow monotonically.
impl PartialOrd for TimerNode {
    fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
        Some(self.cmp(rhs))
    }
}

impl PartialEq for TimerNode {
    fn eq(&self, rhs: &Self) -> bool {
        self.wake_on == rhs.wake_on && self.timer_id == rhs.timer_id
    }
}

impl Eq for TimerNode {}
impl Ord for TimerNode {
    fn cmp(&self, rhs: &Self) -> Ordering {
        self.wake_on
            .cmp(&rhs.wake_on)
            .then(self.timer_id.0.cmp(&rhs.timer_id.0))
            .reverse()
    }
}

// This private version of SleepMode that hides how the timer works: e.g. if it is
// emulated or actual system timer.
enum SleepModeImpl {
    Actual { system_now32_origin: Instant },
    Emulated { emulated_now32: Cell<u32> },
}

impl SleepModeImpl {
    fn now32(&self) -> u32 {
        match self {
            SleepModeImpl::Actual {
                system_now32_origin,
            } => system_now32_origin.elapsed().as_millis() as u32,
            SleepModeImpl::Emulated { emulated_now32 } => emulated_now32.get(),
        }
    }

    // Does actual or emulated sleep depending on reactor's mode
    fn sleep(&self, ms: u32) {
        match self {
            SleepModeImpl::Actual { .. } => Self::actual_sleep(ms),
            SleepModeImpl::Emulated { emulated_now32 } => Self::emulated_sleep(emulated_now32, ms),
        }
    }

    // In emulated sleep we do not sleep, just increase the timer as if time has passed.
    fn emulated_sleep(emulated_now32: &Cell<u32>, ms: u32) {
        emulated_now32.set(emulated_now32.get() + ms);
    }

    // In actual sleep suspend the thread
    fn actual_sleep(ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

// Init SleepModeImpl from SleepMode
impl From<SleepMode> for SleepModeImpl {
    fn from(sleep_mode: SleepMode) -> Self {
        match sleep_mode {
            SleepMode::Actual => SleepModeImpl::Actual {
                system_now32_origin: Instant::now(),
            },
            SleepMode::Emulated => SleepModeImpl::Emulated {
                emulated_now32: Cell::new(0),
            },
        }
    }
}

struct ToyReactorImpl {
    // Timers are stored as binary heap, so we always know what is the first timer
    timers: BinaryHeap<TimerNode>,
    // The BinaryHeap does not support element deletion, so a cancelled timer is only
    // removed from this set and skipped when it reaches the top of the heap.
    live: HashSet<TimerId>,
    last_timer_id: u64,
    sleep_mode: SleepModeImpl,
}

impl ToyReactorImpl {
    fn new(sleep_mode: SleepMode) -> Self {
        ToyReactorImpl {
            timers: BinaryHeap::new(),
            live: HashSet::new(),
            last_timer_id: 0,
            sleep_mode: SleepModeImpl::from(sleep_mode),
        }
    }

    fn schedule_timer(
        &mut self,
        duration: Duration,
        callback: Macrotask,
    ) -> Result<TimerId, TimerError> {
        let duration_ms = TimerNode::get_duration_u32(duration)?;

        self.last_timer_id += 1;
        let timer_id = TimerId(self.last_timer_id);
        modtrace!("ToyReactor: schedule timer {:?} in {}ms", timer_id, duration_ms);

        self.timers
            .push(TimerNode::new(self.now32(), duration_ms, timer_id, callback));
        self.live.insert(timer_id);
        Ok(timer_id)
    }

    fn cancel_timer(&mut self, timer_id: TimerId) -> Result<(), TimerError> {
        modtrace!("ToyReactor: cancel timer {:?}", timer_id);
        if self.live.remove(&timer_id) {
            Ok(())
        } else {
            Err(TimerError::UnknownTimer(timer_id))
        }
    }

    fn now32(&self) -> u32 {
        self.sleep_mode.now32()
    }

    // Removes the first timer that is not cancelled, skipping the cancelled ones
    fn get_first_timer_to_wake(&mut self) -> Option<TimerNode> {
        while let Some(timer_node) = self.timers.pop() {
            if self.live.remove(&timer_node.timer_id) {
                return Some(timer_node);
            }
        }

        None
    }

    fn wait(&mut self) -> Option<Macrotask> {
        let timer_node = self.get_first_timer_to_wake()?;

        let now32 = self.now32();

        // check if sleep is required for timer
        if timer_node.wake_on > now32 {
            self.sleep_mode.sleep(timer_node.wake_on - now32);
        }

        modtrace!("ToyReactor: timer {:?} fired at {}", timer_node.timer_id, self.now32());
        Some(timer_node.callback)
    }
}
