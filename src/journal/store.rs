//! Append-only JSONL journal at `<source_dir>/<output_dir>/journal.jsonl`.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::ExperimentConfig;
use crate::domain::{DataPoint, Step};
use crate::error::{Result, SweeprError};
use crate::jobs::create_if_absent;

use super::record::{StepRecord, config_fingerprint};

pub const JOURNAL_FILENAME: &str = "journal.jsonl";

/// Step journal for one experiment.
#[derive(Debug, Clone)]
pub struct StepJournal {
    path: PathBuf,
    fingerprint: String,
}

impl StepJournal {
    /// Open (without creating) the journal of `config`.
    pub fn open(config: &ExperimentConfig) -> Result<Self> {
        Ok(Self {
            path: config.output_root().join(JOURNAL_FILENAME),
            fingerprint: config_fingerprint(config)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fingerprint of the config this journal was opened with
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Append one record, creating the file and its directory on first use.
    ///
    /// A torn final line left by an interrupted write is cut off first, so
    /// the new record always starts on its own line.
    pub fn append(&self, record: &StepRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_if_absent(parent)?;
        }
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SweeprError::filesystem(&self.path, e))?;
        self.drop_torn_tail(&mut file)
            .map_err(|e| SweeprError::filesystem(&self.path, e))?;
        writeln!(file, "{}", line).map_err(|e| SweeprError::filesystem(&self.path, e))?;
        file.sync_data().map_err(|e| SweeprError::filesystem(&self.path, e))?;
        tracing::debug!(step = record.step, path = %self.path.display(), "Journal record appended");
        Ok(())
    }

    /// Truncate back to the last newline when the file does not end in one.
    fn drop_torn_tail(&self, file: &mut File) -> std::io::Result<()> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] == b'\n' {
            return Ok(());
        }

        let mut content = Vec::with_capacity(len as usize);
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut content)?;
        let keep = content.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1) as u64;
        tracing::warn!(
            path = %self.path.display(),
            dropped_bytes = len - keep,
            "Truncating torn journal line"
        );
        file.set_len(keep)
    }

    /// Every record, oldest first. A missing journal has no records.
    ///
    /// A torn final line (interrupted write) is skipped; a bad line anywhere
    /// else is an error.
    pub fn records(&self) -> Result<Vec<StepRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SweeprError::filesystem(&self.path, e)),
        };

        let lines: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();
        let last = lines.len().saturating_sub(1);

        let mut records = Vec::with_capacity(lines.len());
        for (position, (line_no, line)) in lines.into_iter().enumerate() {
            match serde_json::from_str::<StepRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) if position == last => {
                    tracing::warn!(path = %self.path.display(), line = line_no + 1, error = %e, "Skipping torn journal line");
                }
                Err(e) => {
                    return Err(SweeprError::Journal(format!(
                        "{} line {}: {}",
                        self.path.display(),
                        line_no + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Most recent record.
    pub fn last(&self) -> Result<Option<StepRecord>> {
        Ok(self.records()?.pop())
    }

    /// Fail unless `record` was written under the same config.
    pub fn check_fingerprint(&self, record: &StepRecord) -> Result<()> {
        if record.config_fingerprint != self.fingerprint {
            return Err(SweeprError::Config(format!(
                "experiment config changed since step {} was journaled ({} != {})",
                record.step, record.config_fingerprint, self.fingerprint
            )));
        }
        Ok(())
    }

    /// Step and points to continue from.
    ///
    /// `None` when the journal is empty or its last record terminated.
    pub fn resume_point(&self) -> Result<Option<(Step, Vec<DataPoint>)>> {
        match self.last()? {
            Some(record) => {
                self.check_fingerprint(&record)?;
                Ok(record.next())
            }
            None => Ok(None),
        }
    }
}
