//! Fully-resolved job specifications handed to a scheduler.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::point::{DataPoint, Step};

/// One unit of work for the scheduler.
///
/// Created fresh per (step, job index) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Unique within a step: experiment name + job index
    pub name: String,

    /// Executable the scheduler launches
    pub executable: String,

    /// Command line, program name first
    pub args: Vec<String>,

    /// File receiving the job's stdout
    pub stdout_path: PathBuf,

    /// Per-job directory, `<source>/<output>/step<N>/job<M>`
    pub working_dir: PathBuf,

    /// Step this job belongs to
    pub step: Step,

    /// Position of the point in its batch
    pub index: usize,

    /// Parameter values for this job
    pub point: DataPoint,
}

impl JobSpec {
    /// Environment exported to the job so it can read its own point.
    pub fn environment(&self) -> Vec<(String, String)> {
        vec![
            ("SWEEPR_STEP".to_string(), self.step.to_string()),
            ("SWEEPR_JOB_INDEX".to_string(), self.index.to_string()),
            ("SWEEPR_JOB_NAME".to_string(), self.name.clone()),
            ("SWEEPR_POINT".to_string(), self.point.to_string()),
        ]
    }
}
