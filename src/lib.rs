//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
#[macro_use]
mod modtrace_macro;

mod deferred;
mod error;
mod join;
mod promise;
mod race;
mod reactor;
mod runtime;
mod scheduler;
mod thenable;
mod unhandled;
mod with_runtime;

pub mod toy_rt;

pub use deferred::{PromiseId, PromiseState, Reject, Resolve, Settled};
pub use error::{AggregateError, Error, TimerError};
pub use join::{all, all_settled};
pub use promise::Promise;
pub use race::{any, race};
pub use reactor::{Macrotask, Reactor, TemporalReactor, TimerId};
pub use runtime::{Builder, Runtime};
pub use scheduler::{Microtask, Scheduler};
pub use thenable::{Resolution, Thenable};
pub use toy_rt::ToyReactor;
pub use unhandled::{RejectionHook, UnhandledRejection};
pub use with_runtime::{with_runtime_base, with_runtime_builder};

// This is a help macro to create API for your own runtime based on re-exporting promising
// runtime and specialize it with your reactor.
#[macro_export]
macro_rules! export_runtime {
    ($reactor:ident) => {
        pub type Runtime = $crate::Runtime<$reactor>;
        pub type Builder = $crate::Builder<$reactor>;

        pub use $crate::{Promise, PromiseState, Resolution};

        pub fn with_runtime<ReactorFn, InitF, T, E>(
            reactor_constructor: ReactorFn,
            init: InitF,
        ) -> $crate::PromiseState<T, E>
        where
            // fn setup(rt: &Runtime) -> Promise<T, E>
            InitF: FnOnce(&Runtime) -> $crate::Promise<T, E>,
            ReactorFn: FnOnce() -> $reactor,
            T: Clone + 'static,
            E: Clone + ::std::fmt::Debug + 'static,
        {
            $crate::with_runtime_base(reactor_constructor(), init)
        }
    };
}
