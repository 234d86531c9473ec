//! Scheduler adapter.
//!
//! This module provides:
//! - **Traits**: `Scheduler` hands out scoped `SchedulerSession`s that submit a
//!   batch, wait for every job and release their resources.
//! - **JobSubmitter**: runs one batch per session and returns outcomes in
//!   submission order.
//! - **LocalScheduler**: child processes on this machine.
//! - **MockScheduler**: in-process backend for tests.
//!
//! # Example
//!
//! ```ignore
//! use sweepr::scheduler::{JobSubmitter, LocalScheduler};
//!
//! let submitter = JobSubmitter::new(Arc::new(LocalScheduler::new(8)));
//! let report = submitter.run_batch(&specs).await?;
//! ```

mod local;
pub mod mock;
mod submitter;
mod traits;

pub use local::LocalScheduler;
pub use mock::{CompletionOrder, MockScheduler};
pub use submitter::JobSubmitter;
pub use traits::{Completion, JobHandle, Scheduler, SchedulerSession};
