//! The job lifecycle: a unit of work running on its own dedicated worker thread, polled for
//! completion from the consumer's own context.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use self::status::Terminal;
use crate::wait::WaitFor;

pub mod status;

pub use self::status::{CancelToken, JobStatus};

/// A unit of background work plus the hooks that run when it reaches a terminal state. Implemented
/// by application code; one value per job.
///
/// [`run()`][Self::run] executes on the job's worker thread. The two hooks execute on whichever
/// context calls [`BackgroundJob::update()`], which for a frame-based host is the frame loop's own
/// thread. The job value itself is only ever touched by one context at a time, so the hooks are
/// free to consume whatever `run()` produced in `self`.
pub trait Job: Send + 'static {
    /// The unit of work, executed on the worker thread. This should call
    /// [`CancelToken::is_cancelled()`] at safe points and return early when it reports true,
    /// abandoning or unwinding partial work as appropriate.
    ///
    /// A panic here unwinds the worker thread without ever publishing a terminal state, so from
    /// the consumer's side the job stays pending forever. Work functions that can fail should
    /// catch their own failures and record them in `self` for the hooks to inspect.
    fn run(&mut self, cancel: &CancelToken);

    /// Invoked exactly once, on the polling context, by the first
    /// [`update()`][BackgroundJob::update] call that observes the job as finished.
    fn on_finished(&mut self);

    /// Invoked exactly once, on the polling context, by the first
    /// [`update()`][BackgroundJob::update] call that observes the job as aborted and not
    /// finished.
    fn on_abort(&mut self);
}

/// A handle to a unit of work running on a dedicated background thread. Created in the `Created`
/// state; [`start()`][Self::start] spawns the worker, and the consumer then drives
/// [`update()`][Self::update] or the [`wait_for()`][Self::wait_for] sequence until the job reports
/// a terminal state. Each instance owns its worker thread exclusively and is never restarted.
pub struct BackgroundJob<J: Job> {
    /// The job value, shared with the worker thread. The worker holds the lock for the entire
    /// duration of the work function, and the hooks acquire it through a non-blocking try_lock
    /// once a terminal state has been observed, so no consumer-side call ever waits on it.
    job: Arc<Mutex<J>>,
    status: Arc<JobStatus>,
    /// The worker thread's handle. Wrapped in an `Option` so it can be taken out and reaped once
    /// a terminal state has been observed.
    worker_thread: Option<JoinHandle<()>>,
    started: bool,
    /// Set once a terminal state has been reported through `update()`. The hooks fire exactly
    /// once per job; after this is set `update()` keeps returning true without touching them.
    reported: bool,
}

impl<J: Job> BackgroundJob<J> {
    pub fn new(job: J) -> Self {
        Self {
            job: Arc::new(Mutex::new(job)),
            status: Arc::new(JobStatus::new()),
            worker_thread: None,
            started: false,
            reported: false,
        }
    }

    /// Spawn the worker thread and start executing the work function. Does not block.
    ///
    /// Starting a job twice is a contract violation: it trips a debug assertion in debug builds
    /// and is a logged no-op in release builds.
    pub fn start(&mut self) {
        bg_debug_assert!(
            !self.started,
            "start() called on a job that has already been started"
        );
        if self.started {
            bg_warn!("start() called on a job that has already been started, ignoring");
            return;
        }
        self.started = true;

        let job = Arc::clone(&self.job);
        let status = Arc::clone(&self.status);
        self.worker_thread = Some(
            thread::Builder::new()
                .name(String::from("bg-job"))
                .spawn(move || {
                    let cancel = CancelToken::new(Arc::clone(&status));
                    job.lock().run(&cancel);
                    status.finish();
                })
                .expect("Could not spawn background worker thread"),
        );
    }

    /// Request that the job stop early. This only sets a flag; the work function is expected to
    /// poll its [`CancelToken`] and wind down on its own. Never blocks, and calling it more than
    /// once is harmless.
    ///
    /// Once the worker has acknowledged the request by returning, a subsequent
    /// [`update()`][Self::update] invokes [`Job::on_abort`]. If the work function had already
    /// finished by the time the request landed, the job still resolves as finished.
    pub fn abort(&mut self) {
        self.status.set_aborted(true);
        if !self.started {
            // No worker exists to acknowledge the request, so resolve it here
            self.status.acknowledge_abort();
        }
    }

    /// Poll the job's status once. Returns true when a terminal state has been reached: on the
    /// first such call the matching hook ([`Job::on_finished`] or [`Job::on_abort`]) is invoked
    /// on the calling context, and every later call returns true without invoking anything.
    /// Returns false while the job is still pending. Finished takes priority over aborted when
    /// both are observable.
    ///
    /// This never waits on the worker. Normally the terminal bits only become observable after
    /// the worker has released the job value, so the lock around the hook is uncontended. The raw
    /// flag accessors can also force a terminal state while the worker is still inside the work
    /// function though; in that case the report is deferred to a later poll instead of blocking
    /// on the lock, and this keeps returning false until the worker lets go of the job value.
    pub fn update(&mut self) -> bool {
        if self.reported {
            return true;
        }

        let terminal = match self.status.poll() {
            Some(terminal) => terminal,
            None => return false,
        };
        let mut job = match self.job.try_lock() {
            Some(job) => job,
            // The worker is still holding the job value, try again on a later poll
            None => return false,
        };

        match terminal {
            Terminal::Finished => job.on_finished(),
            Terminal::Aborted => job.on_abort(),
        }
        drop(job);

        self.reap_worker();
        self.reported = true;
        true
    }

    /// The cooperative wait sequence: a fused iterator that calls [`update()`][Self::update] once
    /// per step. `Some(())` means the job is still pending and the host scheduler should step the
    /// sequence again on a later cycle; `None` means the terminal state has been reported. The
    /// sequence yields nothing after termination and can't be restarted. No thread is ever
    /// blocked between steps.
    pub fn wait_for(&mut self) -> WaitFor<'_, J> {
        WaitFor::new(self)
    }

    /// Whether the work function has returned without the job being aborted first.
    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// Set or clear the done flag directly. Completion is normally published by the worker
    /// itself; this setter mirrors the status word's raw accessor pair.
    pub fn set_done(&self, done: bool) {
        self.status.set_done(done)
    }

    /// Whether an abort has been requested.
    pub fn is_aborted(&self) -> bool {
        self.status.is_aborted()
    }

    /// Set or clear the aborted flag directly. Unlike [`abort()`][Self::abort] this performs no
    /// acknowledgement bookkeeping for never-started jobs.
    pub fn set_aborted(&self, aborted: bool) {
        self.status.set_aborted(aborted)
    }

    /// Clean up the worker thread's handle after a terminal state has been reported. When the
    /// worker published that state itself it is already returning and the join is immediate. A
    /// terminal state forced through the raw flag accessors can get here with the worker still
    /// running, in which case the thread is detached rather than waited on.
    fn reap_worker(&mut self) {
        if let Some(handle) = self.worker_thread.take() {
            if handle.is_finished() {
                if handle.join().is_err() {
                    bg_warn!("Worker thread panicked");
                }
            } else {
                bg_trace!("Worker thread still running while its job was reported, detaching");
            }
        }
    }
}

impl<J: Job> Drop for BackgroundJob<J> {
    fn drop(&mut self) {
        if let Some(handle) = self.worker_thread.take() {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                // Joining here could hang the consumer on a work function that never polls its
                // token, so request cancellation and let the worker wind down detached.
                self.status.set_aborted(true);
                bg_trace!("Job handle dropped while its worker was still running, detaching");
            }
        }
    }
}
