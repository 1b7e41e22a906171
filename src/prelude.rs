// Re-export the macros as well so `use bg_job::prelude::*` is all a host needs
pub use crate::debug::*;

pub use crate::job::{BackgroundJob, CancelToken, Job, JobStatus};
pub use crate::wait::WaitFor;
