//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
//
// Tests for unhandled rejection reports
use std::time::Duration;

use promising::toy_rt::{self, Promise, PromiseState};
use promising::{Error, PromiseId, ToyReactor};

use super::measure::{self, new_log, Log};

//const SLEEP_MODE: toy_rt::SleepMode = toy_rt::SleepMode::Actual;
const SLEEP_MODE: toy_rt::SleepMode = toy_rt::SleepMode::Emulated;

// Runtime that records every report of the unhandled rejection hook
fn reporting_runtime() -> (toy_rt::Runtime, Log<(PromiseId, String)>) {
    measure::init_logging();
    let reports = new_log();

    let sink = reports.clone();
    let rt = toy_rt::Runtime::builder(ToyReactor::new_with_mode(SLEEP_MODE))
        .unhandled_rejection_hook(move |rejection| {
            sink.borrow_mut()
                .push((rejection.promise_id, rejection.reason.clone()))
        })
        .build();

    (rt, reports)
}

#[test]
fn unhandled_rejection_is_reported_once() {
    let (rt, reports) = reporting_runtime();

    let lost = Promise::<u32, Error>::reject(&rt, Error::new("nobody listens"));
    rt.run();

    assert_eq!(
        *reports.borrow(),
        vec![(lost.id(), format!("{:?}", Error::new("nobody listens")))]
    );

    // the rejection is still silently kept
    assert_eq!(lost.state(), PromiseState::Rejected(Error::new("nobody listens")));
    assert!(!rt.turn());
    assert_eq!(reports.borrow().len(), 1);
}

#[test]
fn handled_rejection_is_not_reported() {
    let (rt, reports) = reporting_runtime();

    let handled = Promise::<u32, Error>::reject(&rt, Error::new("caught")).catch(|_| Ok(0));

    assert_eq!(rt.block_on(&handled), PromiseState::Fulfilled(0));
    rt.run();
    assert!(reports.borrow().is_empty());
}

#[test]
fn only_the_end_of_a_chain_is_reported() {
    let (rt, reports) = reporting_runtime();

    let last = Promise::<u32, Error>::reject(&rt, Error::new("passed along"))
        .then(|v| Ok(v + 1))
        .then(|v| Ok(v * 2));
    rt.run();

    assert_eq!(reports.borrow().len(), 1);
    assert_eq!(reports.borrow()[0].0, last.id());
}

#[test]
fn handler_attached_in_the_same_microtask_phase_counts() {
    let (rt, reports) = reporting_runtime();

    let (promise, _, reject) = Promise::<u32, Error>::pending(&rt);
    let scheduler = rt.scheduler().clone();
    let observer = promise.clone();
    scheduler.enqueue(move || reject.reject(Error::new("late")));
    scheduler.enqueue(move || {
        let _ = observer.catch(|_| Ok(0));
    });

    rt.run();
    assert!(reports.borrow().is_empty());
}

#[test]
fn handler_attached_after_the_report_is_too_late_for_it() {
    let (rt, reports) = reporting_runtime();

    let rejected = Promise::<u32, Error>::reject(&rt, Error::new("early"));
    let recovered = rejected.clone();
    let (observed, resolve, _) = Promise::<u32, Error>::pending(&rt);
    rt.set_timeout(Duration::from_millis(100), move || {
        resolve.resolve(recovered.catch(|_| Ok(1)).into())
    })
    .expect("timer is scheduled");

    assert_eq!(rt.block_on(&observed), PromiseState::Fulfilled(1));
    assert_eq!(reports.borrow().len(), 1);
    assert_eq!(reports.borrow()[0].0, rejected.id());
}
