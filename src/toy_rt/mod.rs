//  \ O /
//  / * \    promising: settle-once promises on a cooperative microtask queue
// |' | '|   (c) 2020 - present, Vladimir Zvezda
//   / \
mod toy_reactor;

// has to export for the macro
pub use toy_reactor::SleepMode;
pub use toy_reactor::ToyReactor;

// Make a toy runtime
crate::export_runtime!(ToyReactor);

/// Creates the toy runtime with the given sleep mode.
pub fn new_runtime(sleep_mode: SleepMode) -> Runtime {
    Runtime::new(ToyReactor::new_with_mode(sleep_mode))
}

pub fn with_runtime_in_mode<InitF, T, E>(sleep_mode: SleepMode, init: InitF) -> PromiseState<T, E>
where
    InitF: FnOnce(&Runtime) -> Promise<T, E>,
    T: Clone + 'static,
    E: Clone + std::fmt::Debug + 'static,
{
    with_runtime(move || ToyReactor::new_with_mode(sleep_mode), init)
}
