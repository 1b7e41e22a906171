//! Macros for logging and debug assertions. The `bg_debug_assert!()` macro is compiled out during
//! release builds, so it can be used for asserting additional invariants in debug builds. None of
//! the logging macros are realtime-safe, so avoid calling them from a per-frame hot path in
//! release builds.

// NOTE: Exporting macros in Rust is a bit weird. `#[macro_export]` causes them to be exported to
//       the crate root, but that makes it difficult to include just the macros without using
//       `#[macro_use] extern crate bg_job;`. That's why the macros are also re-exported from this
//       module.

/// Write something to the logger. This crate never installs a logger itself; the host application
/// decides where `log`'s output goes.
#[macro_export]
macro_rules! bg_log {
    ($($args:tt)*) => (
        $crate::log::info!($($args)*)
    );
}
#[doc(inline)]
pub use bg_log;

/// Similar to `bg_log!()`, but less subtle. Used for printing warnings.
#[macro_export]
macro_rules! bg_warn {
    ($($args:tt)*) => (
        $crate::log::warn!($($args)*)
    );
}
#[doc(inline)]
pub use bg_warn;

/// The same as `bg_log!()`, but for low level tracing of the job lifecycle.
#[macro_export]
macro_rules! bg_trace {
    ($($args:tt)*) => (
        $crate::log::trace!($($args)*)
    );
}
#[doc(inline)]
pub use bg_trace;

/// A `debug_assert!()` analogue that prints the error with line number information instead of
/// panicking. During tests this is upgraded to a regular panicking `debug_assert!()`.
#[macro_export]
macro_rules! bg_debug_assert {
    ($cond:expr $(,)?) => (
        if cfg!(test) {
           debug_assert!($cond);
        } else if cfg!(debug_assertions) && !$cond {
            $crate::log::warn!(concat!("Debug assertion failed: ", stringify!($cond)));
        }
    );
    ($cond:expr, $format:expr $(, $($args:tt)*)?) => (
        if cfg!(test) {
           debug_assert!($cond, $format, $($($args)*)?);
        } else if cfg!(debug_assertions) && !$cond {
            $crate::log::warn!(concat!("Debug assertion failed: ", stringify!($cond), ", ", $format), $($($args)*)?);
        }
    );
}
#[doc(inline)]
pub use bg_debug_assert;
