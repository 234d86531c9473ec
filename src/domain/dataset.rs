//! Parsed results of one step.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ParseError;

/// Rows of one result file, first row taken as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// The named column parsed as numbers; `None` if missing or any cell is not numeric.
    pub fn column_f64(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)?
            .into_iter()
            .map(|cell| cell.trim().parse::<f64>().ok())
            .collect()
    }
}

/// One discovered result file and what parsing it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub path: PathBuf,
    /// Job index embedded in the file name or implied by the job directory
    pub job_index: Option<usize>,
    pub rows: Result<RowSet, ParseError>,
}

impl DatasetEntry {
    pub fn is_ok(&self) -> bool {
        self.rows.is_ok()
    }

    fn to_json(&self) -> Value {
        match &self.rows {
            Ok(rows) => json!({
                "path": self.path.display().to_string(),
                "job_index": self.job_index,
                "headers": rows.headers,
                "rows": rows.rows,
            }),
            Err(e) => json!({
                "path": self.path.display().to_string(),
                "job_index": self.job_index,
                "error": e.message,
            }),
        }
    }
}

/// Ordered per-file results for one step.
///
/// Parse failures stay in their entry's slot next to the successfully parsed files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultDataset {
    pub entries: Vec<DatasetEntry>,
}

impl ResultDataset {
    pub fn new(entries: Vec<DatasetEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.entries.iter()
    }

    /// Successfully parsed row-sets, in dataset order.
    pub fn row_sets(&self) -> impl Iterator<Item = &RowSet> {
        self.entries.iter().filter_map(|e| e.rows.as_ref().ok())
    }

    /// Per-file parse failures, in dataset order.
    pub fn errors(&self) -> impl Iterator<Item = &ParseError> {
        self.entries.iter().filter_map(|e| e.rows.as_ref().err())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn entry_for_job(&self, index: usize) -> Option<&DatasetEntry> {
        self.entries.iter().find(|e| e.job_index == Some(index))
    }

    pub fn extend(&mut self, other: ResultDataset) {
        self.entries.extend(other.entries);
    }

    /// JSON array handed to external point generators.
    pub fn to_json(&self) -> Value {
        Value::Array(self.entries.iter().map(DatasetEntry::to_json).collect())
    }
}
