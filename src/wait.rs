//! Cooperative waiting for a job from a frame-based host.
//!
//! The wait sequence replaces a blocking join with an explicit poll step. A host scheduler steps
//! the sequence once per cycle; each step polls the job once and either yields `Some(())` to say
//! "still pending, resume me later" or terminates with `None` once the job has reported. No
//! thread is ever held between steps, so a single-threaded frame loop can await any number of
//! jobs this way.

use std::iter::FusedIterator;

use crate::job::{BackgroundJob, Job};

/// A finite, single-use poll sequence over a job, created by
/// [`BackgroundJob::wait_for()`][BackgroundJob::wait_for]. Mutably borrows the job handle for the
/// duration of the wait, so the terminal hook fires from inside the step that first observes it.
pub struct WaitFor<'a, J: Job> {
    job: &'a mut BackgroundJob<J>,
    exhausted: bool,
}

impl<'a, J: Job> WaitFor<'a, J> {
    pub(crate) fn new(job: &'a mut BackgroundJob<J>) -> Self {
        Self {
            job,
            exhausted: false,
        }
    }
}

impl<J: Job> Iterator for WaitFor<'_, J> {
    type Item = ();

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        if self.job.update() {
            self.exhausted = true;
            None
        } else {
            Some(())
        }
    }
}

// Once the sequence has terminated it stays terminated, even though the underlying update() would
// keep reporting true
impl<J: Job> FusedIterator for WaitFor<'_, J> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::CancelToken;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    struct SleepJob {
        duration: Duration,
        finished_count: Arc<AtomicUsize>,
    }

    impl Job for SleepJob {
        fn run(&mut self, _cancel: &CancelToken) {
            thread::sleep(self.duration);
        }

        fn on_finished(&mut self) {
            self.finished_count.fetch_add(1, Ordering::SeqCst);
        }

        fn on_abort(&mut self) {}
    }

    #[test]
    fn terminates_and_stays_exhausted() {
        let finished_count = Arc::new(AtomicUsize::new(0));
        let mut job = BackgroundJob::new(SleepJob {
            duration: Duration::from_millis(50),
            finished_count: Arc::clone(&finished_count),
        });
        job.start();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut pending_steps = 0;
        let mut waiter = job.wait_for();
        while waiter.next().is_some() {
            assert!(Instant::now() < deadline, "wait sequence never terminated");

            pending_steps += 1;
            thread::sleep(Duration::from_millis(10));
        }

        // A 50ms job polled every 10ms suspends at least a few times first
        assert!(pending_steps >= 1);

        // Exhausted for good, even though the job keeps reporting terminal
        assert_eq!(waiter.next(), None);
        assert_eq!(waiter.next(), None);
        drop(waiter);

        assert_eq!(finished_count.load(Ordering::SeqCst), 1);
        assert!(job.update());
    }

    #[test]
    fn first_step_terminates_an_already_reported_job() {
        let finished_count = Arc::new(AtomicUsize::new(0));
        let mut job = BackgroundJob::new(SleepJob {
            duration: Duration::ZERO,
            finished_count: Arc::clone(&finished_count),
        });
        job.start();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !job.update() {
            assert!(Instant::now() < deadline, "job never finished");
            thread::sleep(Duration::from_millis(1));
        }

        // A fresh wait over a job that has already reported terminates on its first step
        assert_eq!(job.wait_for().next(), None);
        assert_eq!(finished_count.load(Ordering::SeqCst), 1);
    }
}
