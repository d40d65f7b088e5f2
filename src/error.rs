//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use std::fmt;

use thiserror::Error as ThisError;

use crate::reactor::TimerId;

/// General purpose rejection reason: an error object that carries a message.
///
/// Any `Clone + Debug` type can be used as a rejection reason, this one is just handy
/// when there is nothing more specific to report.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Error {
    message: String,
}

impl Error {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Error {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::new(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::new(message)
    }
}

impl From<TimerError> for Error {
    fn from(err: TimerError) -> Self {
        Error::new(err.to_string())
    }
}

/// Errors reported by reactor timer operations.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer duration is too big: {requested_ms}ms (max is {max_ms}ms)")]
    DurationTooLong { requested_ms: u128, max_ms: u32 },

    #[error("attempt to cancel unknown timer {0:?}")]
    UnknownTimer(TimerId),
}

/// Rejection reason of [any()](crate::any): every input was rejected.
///
/// Reasons are kept in input order, not in the order of rejection.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("all {} promises were rejected", .errors.len())]
pub struct AggregateError<E: fmt::Debug> {
    pub errors: Vec<E>,
}

impl<E: fmt::Debug> AggregateError<E> {
    pub fn new(errors: Vec<E>) -> Self {
        AggregateError { errors }
    }
}
