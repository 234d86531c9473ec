//! Job specification builder.
//!
//! Prepares every working directory of a batch before returning, so a
//! scheduler never receives a half-prepared batch.

use crate::config::ExperimentConfig;
use crate::domain::{DataPoint, JobSpec, Step};
use crate::error::Result;
use crate::id::job_name;

use super::command_line::build_command_line;
use super::directory::ensure_job_dir;

/// Build one spec per point; job index = position in `points`.
pub fn build_specs(config: &ExperimentConfig, step: Step, points: &[DataPoint]) -> Result<Vec<JobSpec>> {
    config.validate()?;

    let args = build_command_line(config);
    let mut specs = Vec::with_capacity(points.len());

    for (index, point) in points.iter().enumerate() {
        let working_dir = ensure_job_dir(config, step, index)?;
        let stdout_path = working_dir.join(format!("{}{}.txt", config.stdout_basename, index));
        specs.push(JobSpec {
            name: job_name(&config.name, index),
            executable: config.executable().to_string(),
            args: args.clone(),
            stdout_path,
            working_dir,
            step,
            index,
            point: point.clone(),
        });
    }

    tracing::debug!(step, jobs = specs.len(), "Prepared job specs");
    Ok(specs)
}
