//! Scheduler collaborator interfaces.
//!
//! A `Scheduler` hands out sessions; a session accepts a batch of specs,
//! reports a terminal outcome per job and is closed by its owner.

use async_trait::async_trait;

use crate::domain::{JobOutcome, JobSpec};
use crate::error::Result;

/// Reference to one submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    /// Scheduler-assigned identifier, unique within the session
    pub id: String,
    /// Name from the job spec
    pub name: String,
    /// Position of the job in the submitted batch
    pub index: usize,
}

/// Terminal outcome of one job, as reported by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub handle: JobHandle,
    pub outcome: JobOutcome,
}

impl Completion {
    pub fn new(handle: JobHandle, outcome: JobOutcome) -> Self {
        Self { handle, outcome }
    }
}

/// Entry point to an execution backend.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Acquire a session. Failure here is fatal for the step.
    async fn open_session(&self) -> Result<Box<dyn SchedulerSession>>;

    /// Name used in logs
    fn name(&self) -> &str {
        "scheduler"
    }
}

/// A scoped connection to the backend, owned by a single batch.
#[async_trait]
pub trait SchedulerSession: Send {
    fn id(&self) -> &str;

    /// Submit every spec as one batch; one handle per spec.
    async fn submit(&mut self, jobs: &[JobSpec]) -> Result<Vec<JobHandle>>;

    /// Block until every handle reaches a terminal state.
    ///
    /// Completions may come back in any order.
    async fn wait_all(&mut self, handles: &[JobHandle]) -> Result<Vec<Completion>>;

    /// Release backend resources.
    async fn close(&mut self) -> Result<()>;
}
