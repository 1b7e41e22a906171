//! Run a unit of work on a dedicated background thread while a frame-based update loop polls for
//! completion without ever blocking. The core of the crate is [`BackgroundJob`][job::BackgroundJob]
//! and its status handshake: the worker thread publishes a terminal state through a single atomic
//! status word, and the consumer observes it through [`update()`][job::BackgroundJob::update] or
//! the cooperative [`wait_for()`][job::BackgroundJob::wait_for] sequence.

#[macro_use]
pub mod debug;

/// Everything you'd need to run and poll background jobs. Import this with
/// `use bg_job::prelude::*;`.
pub mod prelude;

pub mod job;
pub mod wait;

// The macros in the debug module refer to `$crate::log`, so the log crate needs to be reachable
// from the crate root.
pub use log;
