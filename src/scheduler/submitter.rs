//! Batch submission over a scoped scheduler session.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{BatchReport, JobOutcome, JobSpec};
use crate::error::{Result, SweeprError};

use super::traits::{Completion, JobHandle, Scheduler, SchedulerSession};

/// Runs one batch per call: open session, submit, wait, close.
///
/// The session never outlives `run_batch` and is closed exactly once on
/// every exit path.
pub struct JobSubmitter<S: Scheduler> {
    scheduler: Arc<S>,
}

impl<S: Scheduler> JobSubmitter<S> {
    pub fn new(scheduler: Arc<S>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Arc<S> {
        &self.scheduler
    }

    /// Submit `specs` as one batch and block until every job is terminal.
    ///
    /// Outcomes come back in the order of `specs`. Individual job failures
    /// are reported, not raised.
    pub async fn run_batch(&self, specs: &[JobSpec]) -> Result<BatchReport> {
        let mut session = self
            .scheduler
            .open_session()
            .await
            .map_err(|e| as_scheduler_error("failed to open session", e))?;

        tracing::info!(
            scheduler = self.scheduler.name(),
            session = session.id(),
            jobs = specs.len(),
            "Submitting batch"
        );

        let result = submit_and_wait(session.as_mut(), specs).await;
        let closed = session.close().await;

        match (result, closed) {
            (Ok(report), Ok(())) => {
                tracing::info!(
                    session = session.id(),
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    timed_out = report.timed_out(),
                    "Batch complete"
                );
                Ok(report)
            }
            (Ok(_), Err(close_err)) => Err(as_scheduler_error("failed to close session", close_err)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!(session = session.id(), error = %close_err, "Session close failed after batch error");
                Err(e)
            }
        }
    }
}

async fn submit_and_wait(session: &mut dyn SchedulerSession, specs: &[JobSpec]) -> Result<BatchReport> {
    if specs.is_empty() {
        return Ok(BatchReport::default());
    }

    let handles = session
        .submit(specs)
        .await
        .map_err(|e| as_scheduler_error("submission failed", e))?;
    if handles.len() != specs.len() {
        return Err(SweeprError::Scheduler(format!(
            "submitted {} jobs but received {} handles",
            specs.len(),
            handles.len()
        )));
    }

    let completions = session
        .wait_all(&handles)
        .await
        .map_err(|e| as_scheduler_error("wait failed", e))?;

    order_outcomes(&handles, completions).map(BatchReport::new)
}

/// Place each completion at its handle's position in the submitted batch.
fn order_outcomes(handles: &[JobHandle], completions: Vec<Completion>) -> Result<Vec<JobOutcome>> {
    let positions: HashMap<&str, usize> = handles
        .iter()
        .enumerate()
        .map(|(pos, h)| (h.id.as_str(), pos))
        .collect();

    let mut slots: Vec<Option<JobOutcome>> = vec![None; handles.len()];
    for completion in completions {
        let pos = *positions
            .get(completion.handle.id.as_str())
            .ok_or_else(|| SweeprError::Scheduler(format!("unknown job handle {}", completion.handle.id)))?;
        if slots[pos].replace(completion.outcome).is_some() {
            return Err(SweeprError::Scheduler(format!(
                "duplicate outcome for job {}",
                completion.handle.name
            )));
        }
    }

    slots
        .into_iter()
        .zip(handles)
        .map(|(slot, handle)| {
            slot.ok_or_else(|| SweeprError::Scheduler(format!("no outcome reported for job {}", handle.name)))
        })
        .collect()
}

fn as_scheduler_error(context: &str, err: SweeprError) -> SweeprError {
    match err {
        SweeprError::Scheduler(msg) => SweeprError::Scheduler(format!("{}: {}", context, msg)),
        other => SweeprError::Scheduler(format!("{}: {}", context, other)),
    }
}
