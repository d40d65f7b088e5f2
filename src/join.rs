//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::deferred::Settled;
use crate::promise::Promise;
use crate::scheduler::Scheduler;
use crate::thenable::Resolution;

// enable/disable output of modtrace! macro
const MODTRACE: bool = true;

// Collects results by input index and counts down the items that are not done yet. The
// counter starts at 1 so the join cannot complete while items are still being registered.
struct JoinTracker<R> {
    results: Vec<Option<R>>,
    remaining: usize,
}

impl<R> JoinTracker<R> {
    fn new() -> Self {
        JoinTracker {
            results: Vec::new(),
            remaining: 1,
        }
    }

    // Reserves a slot for the next item and returns its index.
    fn add_item(&mut self) -> usize {
        self.results.push(None);
        self.remaining += 1;
        self.results.len() - 1
    }

    // Stores the item result and returns all results once nothing remains.
    fn complete_item(&mut self, index: usize, result: R) -> Option<Vec<R>> {
        self.results[index] = Some(result);
        self.finish_one()
    }

    fn finish_one(&mut self) -> Option<Vec<R>> {
        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }

        // every slot is filled once the counter reached zero
        Some(self.results.drain(..).flatten().collect())
    }
}

/// Waits for every item to fulfill.
///
/// Items are promises, foreign thenables or plain values (`Resolution::Value`). The
/// returned promise fulfills with the values in input order, whatever the order of
/// completion. It rejects as soon as the first item rejects, with that item's reason: the
/// rest of items keep running, but their outcomes are ignored. No items fulfill with an
/// empty vec.
pub fn all<S, I, T, E>(sched: &S, items: I) -> Promise<Vec<T>, E>
where
    S: AsRef<Scheduler> + ?Sized,
    I: IntoIterator,
    I::Item: Into<Resolution<T, E>>,
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let (joined, resolve, reject) = Promise::<Vec<T>, E>::pending(sched);
    let tracker = Rc::new(RefCell::new(JoinTracker::<T>::new()));

    for item in items {
        let index = tracker.borrow_mut().add_item();
        let element: Promise<T, E> = Promise::resolve_with(sched, item.into());

        let tracker = tracker.clone();
        let resolve = resolve.clone();
        let reject = reject.clone();
        element.on_settled(move |outcome| match outcome {
            Settled::Fulfilled(value) => {
                let done = tracker.borrow_mut().complete_item(index, value);
                if let Some(values) = done {
                    resolve.fulfill(values);
                }
            }
            Settled::Rejected(reason) => {
                modtrace!("all: item #{} rejected, failing fast", index);
                reject.reject(reason);
            }
        });
    }

    modtrace!("all: {:?} joins {} items", joined.id(), tracker.borrow().results.len());
    let done = tracker.borrow_mut().finish_one();
    if let Some(values) = done {
        resolve.fulfill(values);
    }

    joined
}

/// Waits for every item to settle.
///
/// The returned promise fulfills with the outcomes in input order and never rejects. No
/// items fulfill with an empty vec.
pub fn all_settled<S, I, T, E>(sched: &S, items: I) -> Promise<Vec<Settled<T, E>>, E>
where
    S: AsRef<Scheduler> + ?Sized,
    I: IntoIterator,
    I::Item: Into<Resolution<T, E>>,
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let (joined, resolve, _) = Promise::<Vec<Settled<T, E>>, E>::pending(sched);
    let tracker = Rc::new(RefCell::new(JoinTracker::<Settled<T, E>>::new()));

    for item in items {
        let index = tracker.borrow_mut().add_item();
        let element: Promise<T, E> = Promise::resolve_with(sched, item.into());

        let tracker = tracker.clone();
        let resolve = resolve.clone();
        element.on_settled(move |outcome| {
            let done = tracker.borrow_mut().complete_item(index, outcome);
            if let Some(outcomes) = done {
                resolve.fulfill(outcomes);
            }
        });
    }

    let done = tracker.borrow_mut().finish_one();
    if let Some(outcomes) = done {
        resolve.fulfill(outcomes);
    }

    joined
}
