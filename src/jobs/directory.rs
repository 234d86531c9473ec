//! Working-directory layout: `<source_dir>/<output_dir>/step<N>/job<M>`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::ExperimentConfig;
use crate::domain::Step;
use crate::error::{Result, SweeprError};

/// Directory holding every job of `step`.
pub fn step_dir(config: &ExperimentConfig, step: Step) -> PathBuf {
    config.output_root().join(format!("step{}", step))
}

/// Working directory of job `job_index` in `step`. Does not touch the disk.
pub fn job_dir(config: &ExperimentConfig, step: Step, job_index: usize) -> PathBuf {
    step_dir(config, step).join(format!("job{}", job_index))
}

/// Compute the job's working directory and create it (with ancestors) if absent.
///
/// Calling it again for the same pair returns the same path.
pub fn ensure_job_dir(config: &ExperimentConfig, step: Step, job_index: usize) -> Result<PathBuf> {
    let path = job_dir(config, step, job_index);
    create_if_absent(&path)?;
    Ok(path)
}

/// Create-if-absent with an explicit already-exists success case.
pub(crate) fn create_if_absent(path: &Path) -> Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(SweeprError::filesystem(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(root: &Path) -> ExperimentConfig {
        ExperimentConfig::new("sweep", "python3", root, "runs")
    }

    #[test]
    fn test_job_dir_layout() {
        let cfg = ExperimentConfig::new("sweep", "python3", "/data/exp", "runs");
        assert_eq!(job_dir(&cfg, 3, 7), PathBuf::from("/data/exp/runs/step3/job7"));
        assert_eq!(step_dir(&cfg, 0), PathBuf::from("/data/exp/runs/step0"));
    }

    #[test]
    fn test_ensure_creates_ancestors() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());

        let path = ensure_job_dir(&cfg, 0, 1).unwrap();
        assert!(path.is_dir());
        assert_eq!(path, dir.path().join("runs/step0/job1"));
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());

        let first = ensure_job_dir(&cfg, 2, 0).unwrap();
        fs::write(first.join("keep.txt"), "x").unwrap();
        let second = ensure_job_dir(&cfg, 2, 0).unwrap();

        assert_eq!(first, second);
        // existing contents are left alone
        assert!(second.join("keep.txt").exists());
    }

    #[test]
    fn test_ensure_fails_when_path_is_a_file() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());
        fs::create_dir_all(dir.path().join("runs")).unwrap();
        fs::write(dir.path().join("runs/step0"), "not a dir").unwrap();

        let err = ensure_job_dir(&cfg, 0, 0).unwrap_err();
        assert!(matches!(err, SweeprError::Filesystem { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_ensure_distinct_pairs_concurrently() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path());

        std::thread::scope(|s| {
            for i in 0..8 {
                let cfg = &cfg;
                s.spawn(move || ensure_job_dir(cfg, 1, i).unwrap());
            }
        });

        for i in 0..8 {
            assert!(job_dir(&cfg, 1, i).is_dir());
        }
    }
}
