//! Job and batch outcome types.

use serde::{Deserialize, Serialize};

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum JobOutcome {
    /// Job exited successfully
    Succeeded,
    /// Job failed - non-zero exit, spawn failure or scheduler-reported error
    Failed(String),
    /// Job was stopped by the scheduler's timeout
    TimedOut,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

/// Outcomes of one batch, in the order the specs were submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn new(outcomes: Vec<JobOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, JobOutcome::Failed(_)))
            .count()
    }

    pub fn timed_out(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, JobOutcome::TimedOut))
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }

    /// Job indices that did not succeed.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_failure())
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_outcome_variants() {
        assert!(JobOutcome::Succeeded.is_success());
        assert!(JobOutcome::Failed("exit 1".into()).is_failure());
        assert!(JobOutcome::TimedOut.is_failure());
    }

    #[test]
    fn test_job_outcome_serde() {
        let json = serde_json::to_string(&JobOutcome::Failed("exit 2".into())).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"exit 2"}"#);
        let json = serde_json::to_string(&JobOutcome::TimedOut).unwrap();
        assert_eq!(json, r#"{"status":"timed-out"}"#);
        let restored: JobOutcome = serde_json::from_str(r#"{"status":"succeeded"}"#).unwrap();
        assert_eq!(restored, JobOutcome::Succeeded);
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport::new(vec![
            JobOutcome::Succeeded,
            JobOutcome::Failed("boom".into()),
            JobOutcome::TimedOut,
            JobOutcome::Succeeded,
        ]);
        assert_eq!(report.len(), 4);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.timed_out(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.failed_indices(), vec![1, 2]);
    }

    #[test]
    fn test_empty_batch_report() {
        let report = BatchReport::default();
        assert!(report.is_empty());
        assert!(report.all_succeeded());
    }
}
