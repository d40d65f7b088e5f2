//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::deferred::Settled;
use crate::error::AggregateError;
use crate::promise::Promise;
use crate::scheduler::Scheduler;
use crate::thenable::Resolution;

// enable/disable output of modtrace! macro
const MODTRACE: bool = true;

/// Settles exactly like the first item to settle, fulfilled or rejected.
///
/// Later settlements are ignored, the items themselves are not stopped. With no items the
/// returned promise stays pending forever.
pub fn race<S, I, T, E>(sched: &S, items: I) -> Promise<T, E>
where
    S: AsRef<Scheduler> + ?Sized,
    I: IntoIterator,
    I::Item: Into<Resolution<T, E>>,
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let (winner, resolve, reject) = Promise::<T, E>::pending(sched);

    for (index, item) in items.into_iter().enumerate() {
        let element: Promise<T, E> = Promise::resolve_with(sched, item.into());

        let resolve = resolve.clone();
        let reject = reject.clone();
        element.on_settled(move |outcome| {
            if !resolve.is_resolved() {
                modtrace!("race: item #{} settled first", index);
            }
            match outcome {
                Settled::Fulfilled(value) => resolve.fulfill(value),
                Settled::Rejected(reason) => reject.reject(reason),
            }
        });
    }

    winner
}

// Reasons by input index and the number of items that have not rejected yet.
struct AnyTracker<E> {
    reasons: Vec<Option<E>>,
    remaining: usize,
}

/// Fulfills like the first item to fulfill.
///
/// Rejects only when every item rejected, with an [AggregateError] that lists the reasons in
/// input order. With no items the returned promise rejects right away with an empty
/// [AggregateError].
pub fn any<S, I, T, E>(sched: &S, items: I) -> Promise<T, AggregateError<E>>
where
    S: AsRef<Scheduler> + ?Sized,
    I: IntoIterator,
    I::Item: Into<Resolution<T, E>>,
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let (winner, resolve, reject) = Promise::<T, AggregateError<E>>::pending(sched);
    let tracker = Rc::new(RefCell::new(AnyTracker::<E> {
        reasons: Vec::new(),
        remaining: 1,
    }));

    for item in items {
        let index = {
            let mut tracker = tracker.borrow_mut();
            tracker.reasons.push(None);
            tracker.remaining += 1;
            tracker.reasons.len() - 1
        };
        let element: Promise<T, E> = Promise::resolve_with(sched, item.into());

        let tracker = tracker.clone();
        let resolve = resolve.clone();
        let reject = reject.clone();
        element.on_settled(move |outcome| match outcome {
            Settled::Fulfilled(value) => resolve.fulfill(value),
            Settled::Rejected(reason) => {
                let mut tracker = tracker.borrow_mut();
                tracker.reasons[index] = Some(reason);
                tracker.remaining -= 1;
                if tracker.remaining == 0 {
                    let reasons = tracker.reasons.drain(..).flatten().collect();
                    drop(tracker);
                    reject.reject(AggregateError::new(reasons));
                }
            }
        });
    }

    let mut tracker = tracker.borrow_mut();
    tracker.remaining -= 1;
    if tracker.remaining == 0 {
        let reasons = tracker.reasons.drain(..).flatten().collect();
        drop(tracker);
        reject.reject(AggregateError::new(reasons));
    }

    winner
}
