//    ^
//  }/_\{   (c) 2020-present Vladimir Zvezda
//  |\ /|
//    v
use std::fmt;

use crate::deferred::PromiseState;
use crate::promise::Promise;
use crate::reactor::Reactor;
use crate::runtime::{Builder, Runtime};

// This is how you start with promising. The idea that reactor crate wrap this method
// into another one.
//
// The init function sets up the work and returns the promise of the final result. The
// runtime runs to idle, like a process that exits once there is nothing left to do, and the
// state of the promise at that point is returned.
pub fn with_runtime_base<ReactorT, InitF, T, E>(reactor: ReactorT, init: InitF) -> PromiseState<T, E>
where
    ReactorT: Reactor,
    InitF: FnOnce(&Runtime<ReactorT>) -> Promise<T, E>,
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    with_runtime_builder(Builder::new(reactor), init)
}

// Same as with_runtime_base(), for a configured runtime.
pub fn with_runtime_builder<ReactorT, InitF, T, E>(
    builder: Builder<ReactorT>,
    init: InitF,
) -> PromiseState<T, E>
where
    ReactorT: Reactor,
    InitF: FnOnce(&Runtime<ReactorT>) -> Promise<T, E>,
    T: Clone + 'static,
    E: Clone + fmt::Debug + 'static,
{
    let runtime = builder.build();
    let promise = init(&runtime);

    runtime.run();
    promise.state()
}
