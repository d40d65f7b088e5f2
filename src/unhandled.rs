//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::fmt;

use crate::deferred::PromiseId;

/// A report about a promise that was rejected and had no rejection reaction attached by the
/// end of the microtask checkpoint.
///
/// The reason is kept in its `Debug` form, so a single hook can serve promises with
/// different rejection types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnhandledRejection {
    pub promise_id: PromiseId,
    pub reason: String,
}

impl fmt::Display for UnhandledRejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unhandled rejection in {:?}: {}", self.promise_id, self.reason)
    }
}

/// Callback that the runtime invokes for every unhandled rejection.
///
/// App can specify the hook when creating the [`crate::Runtime`] with
/// [`crate::Builder::unhandled_rejection_hook()`]. The hook only observes: rejections stay
/// silently swallowed whatever the hook does.
///
/// The hook may drain the scheduler or settle promises. A rejection it causes is reported
/// after the next drain, not from within the same report.
pub struct RejectionHook {
    report_fn: Box<dyn Fn(&UnhandledRejection)>,
}

impl RejectionHook {
    pub fn new<F>(report_fn: F) -> Self
    where
        F: Fn(&UnhandledRejection) + 'static,
    {
        RejectionHook {
            report_fn: Box::new(report_fn),
        }
    }

    /// Constructs the hook when reports go nowhere (but the `tracing` warning).
    pub fn new_empty() -> Self {
        Self::new(|_| ())
    }

    pub(crate) fn report(&self, rejection: &UnhandledRejection) {
        tracing::warn!(
            promise = ?rejection.promise_id,
            reason = %rejection.reason,
            "unhandled promise rejection"
        );
        (self.report_fn)(rejection);
    }
}

impl Default for RejectionHook {
    fn default() -> Self {
        Self::new_empty()
    }
}
