//! The status handshake between a job's worker thread and the consumer polling it.
//!
//! The original two-booleans-behind-a-mutex design is collapsed into a single atomic status word.
//! That makes the finished-over-aborted priority a property of one atomic load instead of two
//! separately locked reads, and it lets the worker publish its terminal state in a single
//! transition.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

bitflags! {
    /// The status bits for a job, stored in [`JobStatus`]'s atomic word.
    pub(crate) struct StatusFlags: u8 {
        /// The work function returned without the job being aborted first.
        const DONE = 1 << 0;
        /// The consumer requested an abort.
        const ABORTED = 1 << 1;
        /// The worker observed the abort request and returned. Also set when an abort is
        /// requested before the job was ever started, since there is no worker to acknowledge
        /// the request in that case.
        const ABORT_ACKED = 1 << 2;
    }
}

/// The terminal state observed by a single poll of the status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminal {
    /// The work function ran to completion.
    Finished,
    /// An abort was requested and the worker has wound down (or never existed).
    Aborted,
}

/// A job's shared status word. One instance per job, shared between the consumer-side handle and
/// the worker thread.
///
/// The `done` and `aborted` flags of the original design are preserved as individually accessible
/// bits. Observing `DONE` happens-after the work function's return; the `AcqRel` transitions below
/// provide the same ordering guarantee the original mutex did.
#[derive(Debug, Default)]
pub struct JobStatus {
    flags: AtomicU8,
}

impl JobStatus {
    pub(crate) fn new() -> Self {
        Self {
            flags: AtomicU8::new(StatusFlags::empty().bits()),
        }
    }

    fn load(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Whether the work function has returned without being aborted first.
    pub fn is_done(&self) -> bool {
        self.load().contains(StatusFlags::DONE)
    }

    /// Set or clear the done bit directly. The worker's own completion goes through the
    /// `finish()` transition instead; this setter exists for consumers that drive the flag
    /// themselves.
    pub fn set_done(&self, done: bool) {
        if done {
            self.flags.fetch_or(StatusFlags::DONE.bits(), Ordering::AcqRel);
        } else {
            self.flags
                .fetch_and(!StatusFlags::DONE.bits(), Ordering::AcqRel);
        }
    }

    /// Whether an abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.load().contains(StatusFlags::ABORTED)
    }

    /// Set or clear the aborted bit directly.
    pub fn set_aborted(&self, aborted: bool) {
        if aborted {
            self.flags
                .fetch_or(StatusFlags::ABORTED.bits(), Ordering::AcqRel);
        } else {
            self.flags
                .fetch_and(!StatusFlags::ABORTED.bits(), Ordering::AcqRel);
        }
    }

    /// Mark an abort request as acknowledged without a worker round trip. Used when the job was
    /// never started.
    pub(crate) fn acknowledge_abort(&self) {
        self.flags
            .fetch_or(StatusFlags::ABORT_ACKED.bits(), Ordering::AcqRel);
    }

    /// The worker's terminal transition, performed exactly once when the work function returns.
    /// If no abort was requested this publishes `DONE`. If one was requested the return counts as
    /// the acknowledgement instead, so the job resolves as aborted rather than finished.
    pub(crate) fn finish(&self) {
        // The fetch_update can't actually fail since the closure always returns Some
        let _ = self
            .flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let flags = StatusFlags::from_bits_truncate(bits);
                if flags.contains(StatusFlags::ABORTED) {
                    Some((flags | StatusFlags::ABORT_ACKED).bits())
                } else {
                    Some((flags | StatusFlags::DONE).bits())
                }
            });
    }

    /// Poll the status word once. `DONE` takes priority over an acknowledged abort, so a job
    /// whose work finished before anyone looked always resolves as finished even if an abort was
    /// requested afterwards. An unacknowledged abort is not yet terminal since the worker may
    /// still be running.
    pub(crate) fn poll(&self) -> Option<Terminal> {
        let flags = self.load();
        if flags.contains(StatusFlags::DONE) {
            Some(Terminal::Finished)
        } else if flags.contains(StatusFlags::ABORTED | StatusFlags::ABORT_ACKED) {
            Some(Terminal::Aborted)
        } else {
            None
        }
    }
}

/// A cheap clonable view of a job's status handed to the work function, used for cooperative
/// cancellation. The work function should call [`is_cancelled()`][Self::is_cancelled] at safe
/// points and return early when it reports true. A work function that never polls the token
/// keeps running after an abort request; whenever it finally returns, that return counts as the
/// acknowledgement and the job still resolves as aborted.
#[derive(Debug, Clone)]
pub struct CancelToken {
    status: Arc<JobStatus>,
}

impl CancelToken {
    pub(crate) fn new(status: Arc<JobStatus>) -> Self {
        Self { status }
    }

    /// Whether an abort has been requested for this job.
    pub fn is_cancelled(&self) -> bool {
        self.status.is_aborted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_without_abort_resolves_as_finished() {
        let status = JobStatus::new();
        assert_eq!(status.poll(), None);

        status.finish();

        assert!(status.is_done());
        assert_eq!(status.poll(), Some(Terminal::Finished));
    }

    #[test]
    fn finish_after_abort_counts_as_acknowledgement() {
        let status = JobStatus::new();
        status.set_aborted(true);

        // An unacknowledged abort is not yet terminal
        assert_eq!(status.poll(), None);

        status.finish();

        assert!(!status.is_done());
        assert_eq!(status.poll(), Some(Terminal::Aborted));
    }

    #[test]
    fn abort_after_finish_keeps_finished_priority() {
        let status = JobStatus::new();
        status.finish();
        status.set_aborted(true);

        assert!(status.is_done());
        assert!(status.is_aborted());
        assert_eq!(status.poll(), Some(Terminal::Finished));
    }

    #[test]
    fn accessors_set_and_clear_individual_bits() {
        let status = JobStatus::new();

        status.set_done(true);
        status.set_aborted(true);
        assert!(status.is_done());
        assert!(status.is_aborted());

        status.set_done(false);
        assert!(!status.is_done());
        assert!(status.is_aborted());
    }

    #[test]
    fn cancel_token_tracks_the_abort_flag() {
        let status = Arc::new(JobStatus::new());
        let token = CancelToken::new(Arc::clone(&status));

        assert!(!token.is_cancelled());
        status.set_aborted(true);
        assert!(token.is_cancelled());
    }
}
