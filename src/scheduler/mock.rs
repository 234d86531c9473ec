//! In-process scheduler for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{JobOutcome, JobSpec};
use crate::error::{Result, SweeprError};
use crate::id::{generate_handle_id, generate_session_id};

use super::traits::{Completion, JobHandle, Scheduler, SchedulerSession};

/// Order in which the mock reports completions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionOrder {
    #[default]
    Submission,
    Reverse,
}

/// Side effect run for each job when it "executes", e.g. writing a result file.
pub type JobHook = Arc<dyn Fn(&JobSpec) + Send + Sync>;

#[derive(Default)]
struct MockState {
    opens: AtomicUsize,
    closes: AtomicUsize,
    submitted: Mutex<Vec<JobSpec>>,
}

/// Scheduler that "runs" jobs by calling an optional hook and reporting
/// configured outcomes.
#[derive(Clone, Default)]
pub struct MockScheduler {
    outcomes: HashMap<usize, JobOutcome>,
    order: CompletionOrder,
    fail_open: bool,
    fail_submit: bool,
    fail_close: bool,
    hook: Option<JobHook>,
    state: Arc<MockState>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome for the job at `index`; unlisted jobs succeed.
    pub fn with_outcome(mut self, index: usize, outcome: JobOutcome) -> Self {
        self.outcomes.insert(index, outcome);
        self
    }

    pub fn with_completion_order(mut self, order: CompletionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_hook(mut self, hook: impl Fn(&JobSpec) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Sessions opened so far
    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    /// Sessions closed so far
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Every spec submitted across all sessions
    pub fn submitted(&self) -> Vec<JobSpec> {
        self.state.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Scheduler for MockScheduler {
    async fn open_session(&self) -> Result<Box<dyn SchedulerSession>> {
        if self.fail_open {
            return Err(SweeprError::Scheduler("mock refused session".into()));
        }
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            id: generate_session_id(),
            scheduler: self.clone(),
            jobs: HashMap::new(),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockSession {
    id: String,
    scheduler: MockScheduler,
    jobs: HashMap<String, JobSpec>,
}

#[async_trait]
impl SchedulerSession for MockSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(&mut self, jobs: &[JobSpec]) -> Result<Vec<JobHandle>> {
        if self.scheduler.fail_submit {
            return Err(SweeprError::Scheduler("mock rejected batch".into()));
        }
        if let Ok(mut submitted) = self.scheduler.state.submitted.lock() {
            submitted.extend_from_slice(jobs);
        }
        Ok(jobs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let handle = JobHandle {
                    id: generate_handle_id(&self.id, &spec.name),
                    name: spec.name.clone(),
                    index,
                };
                self.jobs.insert(handle.id.clone(), spec.clone());
                handle
            })
            .collect())
    }

    async fn wait_all(&mut self, handles: &[JobHandle]) -> Result<Vec<Completion>> {
        let mut ordered: Vec<&JobHandle> = handles.iter().collect();
        if self.scheduler.order == CompletionOrder::Reverse {
            ordered.reverse();
        }

        let mut completions = Vec::with_capacity(handles.len());
        for handle in ordered {
            let spec = self
                .jobs
                .get(&handle.id)
                .ok_or_else(|| SweeprError::Scheduler(format!("unknown handle {}", handle.id)))?;
            if let Some(hook) = &self.scheduler.hook {
                hook(spec);
            }
            let outcome = self
                .scheduler
                .outcomes
                .get(&handle.index)
                .cloned()
                .unwrap_or(JobOutcome::Succeeded);
            completions.push(Completion::new(handle.clone(), outcome));
        }
        Ok(completions)
    }

    async fn close(&mut self) -> Result<()> {
        self.scheduler.state.closes.fetch_add(1, Ordering::SeqCst);
        self.jobs.clear();
        if self.scheduler.fail_close {
            return Err(SweeprError::Scheduler("mock close failed".into()));
        }
        Ok(())
    }
}
