// tracing for development, goes to the `tracing` subscriber under the module target
#[macro_use]
macro_rules! modtrace {
    ($fmt_str:tt)
        => ( if (MODTRACE) { tracing::trace!($fmt_str) });
    ($fmt_str:tt, $($x:expr),* )
        => ( if (MODTRACE) { tracing::trace!($fmt_str, $($x),* ) });
}
