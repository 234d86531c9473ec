//! One line of the step journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::ExperimentConfig;
use crate::domain::{DataPoint, JobOutcome, ResultDataset, Step};
use crate::error::Result;

/// A completed cycle: what ran, what came back, what was proposed next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub recorded_at: DateTime<Utc>,
    pub config_fingerprint: String,
    pub points: Vec<DataPoint>,
    pub outcomes: Vec<JobOutcome>,
    /// Result files found for the step
    pub collected: usize,
    pub parse_failures: usize,
    /// Points for the next step; `None` once the loop terminated
    pub proposal: Option<Vec<DataPoint>>,
}

impl StepRecord {
    pub fn new(
        step: Step,
        config_fingerprint: impl Into<String>,
        points: Vec<DataPoint>,
        outcomes: Vec<JobOutcome>,
        dataset: &ResultDataset,
        proposal: Option<Vec<DataPoint>>,
    ) -> Self {
        Self {
            step,
            recorded_at: Utc::now(),
            config_fingerprint: config_fingerprint.into(),
            points,
            outcomes,
            collected: dataset.len(),
            parse_failures: dataset.error_count(),
            proposal: proposal.filter(|p| !p.is_empty()),
        }
    }

    pub fn terminated(&self) -> bool {
        self.proposal.is_none()
    }

    /// Step and points the loop continues with, if it did not terminate.
    pub fn next(&self) -> Option<(Step, Vec<DataPoint>)> {
        self.proposal.clone().map(|points| (self.step + 1, points))
    }
}

/// SHA-256 hex of the config's JSON form.
pub fn config_fingerprint(config: &ExperimentConfig) -> Result<String> {
    let json = serde_json::to_vec(config)?;
    Ok(hex::encode(Sha256::digest(&json)))
}
