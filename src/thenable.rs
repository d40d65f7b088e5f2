//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
use crate::deferred::{PromiseId, Reject, Resolve};
use crate::promise::Promise;

/// Anything that can eventually settle a promise: the "future-like" capability.
///
/// Resolving a promise with a thenable never wraps it. The promise invokes
/// [Thenable::then_settle()] from a microtask and adopts whatever the thenable reports
/// through the resolving functions, so foreign implementations interoperate with
/// [Promise] by capability and not by type. Only the first call of either resolving
/// function counts; returning `Err` rejects the promise unless it was already resolved.
pub trait Thenable<T, E> {
    fn then_settle(self: Box<Self>, resolve: Resolve<T, E>, reject: Reject<T, E>)
        -> Result<(), E>;

    /// Identity of the promise behind the thenable, if there is one. Used to detect a
    /// promise resolved with itself.
    fn promise_id(&self) -> Option<PromiseId> {
        None
    }
}

/// What a promise is resolved with: a plain value or a thenable to chase.
pub enum Resolution<T, E> {
    Value(T),
    Thenable(Box<dyn Thenable<T, E>>),
}

impl<T, E> Resolution<T, E> {
    pub fn chase<ThenableT>(thenable: ThenableT) -> Self
    where
        ThenableT: Thenable<T, E> + 'static,
    {
        Resolution::Thenable(Box::new(thenable))
    }
}

impl<T, E> From<Promise<T, E>> for Resolution<T, E>
where
    Promise<T, E>: Thenable<T, E> + 'static,
{
    fn from(promise: Promise<T, E>) -> Self {
        Resolution::Thenable(Box::new(promise))
    }
}
