//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
//
// Shared code for tests

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use promising::toy_rt::{self, Promise};

static INIT_LOGGING: Once = Once::new();

/// Sends `tracing` output of the crate to the test writer, first call wins.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

///
pub fn assert_duration(actual: u32, expected: u32) {
    let actual = actual as i64;
    let expected = expected as i64;

    assert!(
        i64::abs(actual - expected) < 100,
        "Duration is in unexpected range: actual: {}, expected: {}, diff: {} > 100",
        actual,
        expected,
        i64::abs(actual - expected)
    );
}

/// A promise that fulfills with the value after `ms` milliseconds.
pub fn delayed<T, E>(rt: &toy_rt::Runtime, ms: u64, value: T) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + Debug + 'static,
{
    Promise::new(rt, |resolve, _| {
        rt.set_timeout(Duration::from_millis(ms), move || resolve.fulfill(value))
            .expect("timer is scheduled");
        Ok(())
    })
}

/// A promise that rejects with the reason after `ms` milliseconds.
pub fn delayed_reject<T, E>(rt: &toy_rt::Runtime, ms: u64, reason: E) -> Promise<T, E>
where
    T: Clone + 'static,
    E: Clone + Debug + 'static,
{
    Promise::new(rt, |_, reject| {
        rt.set_timeout(Duration::from_millis(ms), move || reject.reject(reason))
            .expect("timer is scheduled");
        Ok(())
    })
}

/// Side effect log shared between handlers and the test body.
pub type Log<T> = Rc<RefCell<Vec<T>>>;

pub fn new_log<T>() -> Log<T> {
    Rc::new(RefCell::new(Vec::new()))
}

/// Runs the promise to the end and returns the time it took.
pub fn measure_settle<T, E>(rt: &toy_rt::Runtime, promise: &Promise<T, E>) -> u32
where
    T: Clone + 'static,
    E: Clone + Debug + 'static,
{
    let start = rt.io().now32();
    rt.block_on(promise);
    rt.io().now32() - start
}
