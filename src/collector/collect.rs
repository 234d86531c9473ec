//! Result collection.
//!
//! Lists result files in a directory (no recursion), parses each one and
//! keeps per-file failures in their slot instead of aborting.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ExperimentConfig;
use crate::domain::{DatasetEntry, ResultDataset, Step};
use crate::error::{Result, SweeprError};
use crate::jobs::job_dir;

use super::tabular::{DelimitedParser, TabularParser};

/// Scans directories for result files and parses them.
#[derive(Clone)]
pub struct ResultCollector {
    parser: Arc<dyn TabularParser>,
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new(Arc::new(DelimitedParser::default()))
    }
}

impl ResultCollector {
    pub fn new(parser: Arc<dyn TabularParser>) -> Self {
        Self { parser }
    }

    /// Parse every file in `directory` whose name ends with `extension`.
    ///
    /// Files are ordered by the job index embedded at the end of their stem
    /// (`output3.csv` -> 3); files without one follow, by name. A missing
    /// directory or no matching files yields an empty dataset.
    pub fn collect(&self, directory: &Path, extension: &str) -> Result<ResultDataset> {
        let files = match list_matching(directory, extension) {
            Ok(files) => files,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(dir = %directory.display(), "Collection directory does not exist");
                return Ok(ResultDataset::default());
            }
            Err(e) => return Err(SweeprError::filesystem(directory, e)),
        };

        let entries: Vec<DatasetEntry> = files
            .into_iter()
            .map(|(path, job_index)| {
                let rows = self.parser.parse(&path);
                if let Err(e) = &rows {
                    tracing::warn!(file = %path.display(), error = %e.message, "Result file failed to parse");
                }
                DatasetEntry { path, job_index, rows }
            })
            .collect();

        let dataset = ResultDataset::new(entries);
        tracing::debug!(
            dir = %directory.display(),
            files = dataset.len(),
            parse_failures = dataset.error_count(),
            "Collected results"
        );
        Ok(dataset)
    }

    /// Collect from each job directory of `step`, in job order.
    ///
    /// Entries are tagged with the index of the job directory they came from.
    pub fn collect_job_dirs(&self, config: &ExperimentConfig, step: Step, jobs: usize) -> Result<ResultDataset> {
        let mut dataset = ResultDataset::default();
        for index in 0..jobs {
            let mut found = self.collect(&job_dir(config, step, index), &config.output_extension)?;
            for entry in &mut found.entries {
                entry.job_index = Some(index);
            }
            dataset.extend(found);
        }
        Ok(dataset)
    }
}

/// Matching regular files with their embedded job index, sorted.
///
/// A file matches when its name ends with `extension` exactly, so `csv`,
/// `.csv` and `_out.dat` are all valid.
fn list_matching(directory: &Path, extension: &str) -> std::io::Result<Vec<(PathBuf, Option<usize>)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            tracing::warn!(
                dir = %directory.display(),
                file = %name.to_string_lossy(),
                "Skipping result file with a non-UTF-8 name"
            );
            continue;
        };
        if !name.ends_with(extension) || !entry.file_type()?.is_file() {
            continue;
        }
        let stem = name[..name.len() - extension.len()].trim_end_matches('.');
        files.push((entry.path(), trailing_index(stem)));
    }

    files.sort_by(|(a_path, a_idx), (b_path, b_idx)| {
        (a_idx.is_none(), a_idx, a_path.file_name()).cmp(&(b_idx.is_none(), b_idx, b_path.file_name()))
    });
    Ok(files)
}

/// Digits at the end of a file stem: `output12` -> 12.
fn trailing_index(stem: &str) -> Option<usize> {
    let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    stem[stem.len() - digits..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(dataset: &ResultDataset) -> Vec<String> {
        dataset
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_trailing_index() {
        assert_eq!(trailing_index("output12"), Some(12));
        assert_eq!(trailing_index("run3b"), None);
        assert_eq!(trailing_index("a"), None);
        assert_eq!(trailing_index("7"), Some(7));
    }

    #[test]
    fn test_two_matching_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x\n2\n").unwrap();
        fs::write(dir.path().join("a.csv"), "x\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let dataset = ResultCollector::default().collect(dir.path(), "csv").unwrap();
        assert_eq!(names(&dataset), vec!["a.csv", "b.csv"]);
        assert_eq!(dataset.error_count(), 0);
    }

    #[test]
    fn test_no_matching_files_is_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let dataset = ResultCollector::default().collect(dir.path(), "csv").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_empty_directory_is_empty() {
        let dir = tempdir().unwrap();
        let dataset = ResultCollector::default().collect(dir.path(), "csv").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let dataset = ResultCollector::default()
            .collect(&dir.path().join("never-created"), "csv")
            .unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_sorted_by_embedded_index() {
        let dir = tempdir().unwrap();
        for name in ["output10.csv", "output2.csv", "summary.csv", "output0.csv"] {
            fs::write(dir.path().join(name), "v\n1\n").unwrap();
        }

        let dataset = ResultCollector::default().collect(dir.path(), "csv").unwrap();
        assert_eq!(
            names(&dataset),
            vec!["output0.csv", "output2.csv", "output10.csv", "summary.csv"]
        );
        assert_eq!(dataset.entries[2].job_index, Some(10));
        assert_eq!(dataset.entries[3].job_index, None);
    }

    #[test]
    fn test_parse_failure_kept_in_slot() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("out0.csv"), "x,y\n1,2\n").unwrap();
        fs::write(dir.path().join("out1.csv"), "").unwrap();
        fs::write(dir.path().join("out2.csv"), "x,y\n5,6\n").unwrap();

        let dataset = ResultCollector::default().collect(dir.path(), ".csv").unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(dataset.entries[0].is_ok());
        assert!(!dataset.entries[1].is_ok());
        assert!(dataset.entries[2].is_ok());
        assert_eq!(dataset.row_sets().count(), 2);
    }

    #[test]
    fn test_no_recursion_and_directories_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested.csv")).unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/deep.csv"), "x\n1\n").unwrap();

        let dataset = ResultCollector::default().collect(dir.path(), "csv").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_extension_is_a_plain_suffix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("job3_out.dat"), "v\n1\n").unwrap();
        fs::write(dir.path().join("resultscsv"), "v\n2\n").unwrap();
        fs::write(dir.path().join("job1.dat"), "v\n3\n").unwrap();

        let multi = ResultCollector::default().collect(dir.path(), "_out.dat").unwrap();
        assert_eq!(names(&multi), vec!["job3_out.dat"]);
        assert_eq!(multi.entries[0].job_index, Some(3));

        let bare = ResultCollector::default().collect(dir.path(), "csv").unwrap();
        assert_eq!(names(&bare), vec!["resultscsv"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.csv")), "v\n1\n").unwrap();
        fs::write(dir.path().join("good0.csv"), "v\n1\n").unwrap();

        let dataset = ResultCollector::default().collect(dir.path(), "csv").unwrap();
        assert_eq!(names(&dataset), vec!["good0.csv"]);
    }

    #[test]
    fn test_collect_job_dirs_tags_index() {
        let dir = tempdir().unwrap();
        let config = ExperimentConfig::new("sweep", "prog", dir.path(), "runs");
        for i in [0usize, 2] {
            let job = job_dir(&config, 1, i);
            fs::create_dir_all(&job).unwrap();
            fs::write(job.join("result.csv"), format!("loss\n{}\n", i)).unwrap();
        }

        let dataset = ResultCollector::default().collect_job_dirs(&config, 1, 3).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.entries[0].job_index, Some(0));
        assert_eq!(dataset.entries[1].job_index, Some(2));
    }

    #[test]
    fn test_custom_parser() {
        struct CountingParser;
        impl TabularParser for CountingParser {
            fn parse(&self, path: &Path) -> std::result::Result<crate::domain::RowSet, crate::error::ParseError> {
                Ok(crate::domain::RowSet::new(
                    vec!["file".to_string()],
                    vec![vec![path.display().to_string()]],
                ))
            }
        }

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.dat"), "anything").unwrap();
        let collector = ResultCollector::new(Arc::new(CountingParser));
        let dataset = collector.collect(dir.path(), "dat").unwrap();
        assert_eq!(dataset.len(), 1);
    }
}
