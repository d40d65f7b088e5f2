//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
//
// Tests for the event loop phases and timers
use std::time::Duration;

use promising::toy_rt::{self, Promise, PromiseState};
use promising::{Error, TemporalReactor, TimerError, TimerId, ToyReactor};

use super::measure::new_log;

//const SLEEP_MODE: toy_rt::SleepMode = toy_rt::SleepMode::Actual;
const SLEEP_MODE: toy_rt::SleepMode = toy_rt::SleepMode::Emulated;

#[test]
fn timers_fire_in_due_order_and_ties_keep_schedule_order() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);
    let log = new_log();

    for (name, ms) in vec![("c", 300), ("a", 100), ("b1", 200), ("b2", 200)] {
        let log = log.clone();
        rt.set_timeout(Duration::from_millis(ms), move || log.borrow_mut().push(name))
            .expect("timer is scheduled");
    }
    rt.run();

    assert_eq!(*log.borrow(), vec!["a", "b1", "b2", "c"]);
    assert_eq!(rt.io().now32(), 300);
}

#[test]
fn microtasks_run_before_the_next_timer() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);
    let log = new_log();

    let (first, reaction, second) = (log.clone(), log.clone(), log.clone());
    let scheduler = rt.scheduler().clone();
    rt.set_timeout(Duration::from_millis(10), move || {
        first.borrow_mut().push("timer 1");
        let _ = Promise::<(), Error>::resolve(&scheduler, ()).then(move |_| {
            reaction.borrow_mut().push("reaction of timer 1");
            Ok(())
        });
    })
    .expect("timer is scheduled");
    rt.set_timeout(Duration::from_millis(10), move || second.borrow_mut().push("timer 2"))
        .expect("timer is scheduled");

    rt.run();
    assert_eq!(
        *log.borrow(),
        vec!["timer 1", "reaction of timer 1", "timer 2"]
    );
}

#[test]
fn cleared_timer_does_not_fire() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let promise = Promise::<&str, Error>::new(&rt, |resolve, _| {
        let cancelled = resolve.clone();
        let id = rt.set_timeout(Duration::from_millis(100), move || cancelled.fulfill("early"))?;
        rt.set_timeout(Duration::from_millis(200), move || resolve.fulfill("late"))?;
        rt.clear_timeout(id)?;
        Ok(())
    });

    assert_eq!(rt.block_on(&promise), PromiseState::Fulfilled("late"));
    assert_eq!(rt.io().scheduled_timers(), 0);
}

#[test]
fn clearing_unknown_or_fired_timer_is_an_error() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let id = rt.set_timeout(Duration::from_millis(1), || ()).expect("timer is scheduled");
    rt.run();

    assert_eq!(rt.clear_timeout(id), Err(TimerError::UnknownTimer(id)));
    assert_eq!(
        rt.clear_timeout(TimerId::null()),
        Err(TimerError::UnknownTimer(TimerId::null()))
    );
}

#[test]
fn too_long_timer_is_refused() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let two_days = Duration::from_secs(2 * 24 * 60 * 60);
    let result = rt.set_timeout(two_days, || ());

    assert_eq!(
        result,
        Err(TimerError::DurationTooLong {
            requested_ms: two_days.as_millis(),
            max_ms: ToyReactor::MAX_TIMER_DURATION_MS,
        })
    );
    assert_eq!(rt.io().scheduled_timers(), 0);
}

#[test]
fn timer_errors_reject_through_the_initializer() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let promise = Promise::<(), Error>::new(&rt, |resolve, _| {
        rt.set_timeout(Duration::from_secs(3 * 24 * 60 * 60), move || resolve.fulfill(()))?;
        Ok(())
    });

    match rt.block_on(&promise) {
        PromiseState::Rejected(err) => assert!(err.message().starts_with("timer duration is too big")),
        other => panic!("unexpected state {:?}", other),
    }
}
