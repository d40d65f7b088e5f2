//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
//
// Tests for Promise::race() and Promise::any()
use proptest::prelude::*;

use promising::toy_rt::{self, Promise, PromiseState, Resolution};
use promising::{AggregateError, Error};

use super::measure::{self, assert_duration, delayed, delayed_reject};

//const SLEEP_MODE: toy_rt::SleepMode = toy_rt::SleepMode::Actual;
const SLEEP_MODE: toy_rt::SleepMode = toy_rt::SleepMode::Emulated;

#[test]
fn race_settles_like_the_fastest() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let items = vec![
        delayed::<&str, Error>(&rt, 500, "foo"),
        delayed::<&str, Error>(&rt, 100, "bar"),
    ];
    let winner = Promise::<&str, Error>::race(&rt, items);

    let elapsed = measure::measure_settle(&rt, &winner);
    assert_eq!(winner.state(), PromiseState::Fulfilled("bar"));
    assert_duration(elapsed, 100);
}

#[test]
fn race_ignores_the_slower_one() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let items = vec![
        delayed::<&str, Error>(&rt, 1000, "foo"),
        delayed::<&str, Error>(&rt, 2000, "bar"),
    ];
    let winner = Promise::<&str, Error>::race(&rt, items);

    assert_eq!(rt.block_on(&winner), PromiseState::Fulfilled("foo"));
}

#[test]
fn race_adopts_the_first_rejection() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let items = vec![
        delayed::<&str, Error>(&rt, 500, "too late"),
        delayed_reject::<&str, Error>(&rt, 100, Error::new("timeout")),
    ];
    let winner = Promise::<&str, Error>::race(&rt, items);

    assert_eq!(rt.block_on(&winner), PromiseState::Rejected(Error::new("timeout")));

    // the slow one is not stopped, but nothing changes anymore
    rt.run();
    assert_eq!(winner.state(), PromiseState::Rejected(Error::new("timeout")));
}

#[test]
fn race_with_timeout_lets_the_fast_request_win() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let request = delayed::<&str, Error>(&rt, 300, "response");
    let timeout = delayed_reject::<&str, Error>(&rt, 1000, Error::new("timed out"));
    let winner = Promise::<&str, Error>::race(&rt, vec![request, timeout]);

    assert_eq!(rt.block_on(&winner), PromiseState::Fulfilled("response"));
}

#[test]
fn race_of_a_plain_value_beats_a_ready_promise() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let items = vec![
        Resolution::Value(1),
        Resolution::from(Promise::<u32, Error>::resolve(&rt, 2)),
    ];
    let winner = Promise::<u32, Error>::race(&rt, items);

    // both are ready, the first item reacts first
    assert!(winner.is_pending());
    assert_eq!(rt.block_on(&winner), PromiseState::Fulfilled(1));
}

#[test]
fn race_of_nothing_stays_pending_forever() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let winner = Promise::<u32, Error>::race(&rt, Vec::<Promise<u32, Error>>::new());

    rt.run();
    assert_eq!(winner.state(), PromiseState::Pending);
}

#[test]
fn any_fulfills_with_the_first_fulfillment() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let items = vec![
        delayed_reject::<u32, Error>(&rt, 50, Error::new("fast failure")),
        delayed::<u32, Error>(&rt, 300, 3),
        delayed::<u32, Error>(&rt, 200, 2),
    ];
    let first = Promise::<u32, Error>::any(&rt, items);

    let elapsed = measure::measure_settle(&rt, &first);
    assert_eq!(first.state(), PromiseState::Fulfilled(2));
    assert_duration(elapsed, 200);
}

#[test]
fn any_rejects_with_reasons_in_input_order() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let items = vec![
        delayed_reject::<u32, Error>(&rt, 300, Error::new("first")),
        delayed_reject::<u32, Error>(&rt, 100, Error::new("second")),
        delayed_reject::<u32, Error>(&rt, 200, Error::new("third")),
    ];
    let first = Promise::<u32, Error>::any(&rt, items);

    match rt.block_on(&first) {
        PromiseState::Rejected(aggregate) => {
            assert_eq!(
                aggregate.errors,
                vec![Error::new("first"), Error::new("second"), Error::new("third")]
            );
            assert_eq!(aggregate.to_string(), "all 3 promises were rejected");
        }
        other => panic!("unexpected state {:?}", other),
    }
}

#[test]
fn any_of_nothing_rejects_right_away() {
    let rt = toy_rt::new_runtime(SLEEP_MODE);

    let first = Promise::<u32, Error>::any(&rt, Vec::<Promise<u32, Error>>::new());

    assert_eq!(first.state(), PromiseState::Rejected(AggregateError::new(Vec::new())));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn race_is_won_by_the_shortest_delay(delays in prop::collection::vec(1u64..1000, 1..12)) {
        let rt = toy_rt::new_runtime(SLEEP_MODE);

        let items = delays
            .iter()
            .enumerate()
            .map(|(index, ms)| delayed::<usize, Error>(&rt, *ms, index))
            .collect::<Vec<_>>();
        let winner = Promise::<usize, Error>::race(&rt, items);

        // on a tie the item that was scheduled first wins
        let min = delays.iter().min().copied().unwrap_or_default();
        let expected = delays.iter().position(|ms| *ms == min).unwrap_or_default();
        prop_assert_eq!(rt.block_on(&winner), PromiseState::Fulfilled(expected));
    }
}
