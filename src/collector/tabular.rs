//! Tabular result-file parsing.

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;

use crate::domain::RowSet;
use crate::error::ParseError;

/// Reads one result file into a row-set.
pub trait TabularParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<RowSet, ParseError>;
}

/// Comma- or whitespace-delimited text with a header row.
///
/// The delimiter is chosen from the first non-empty line: comma if it has
/// one, whitespace otherwise.
#[derive(Debug, Clone)]
pub struct DelimitedParser {
    has_headers: bool,
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self { has_headers: true }
    }
}

impl DelimitedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat every line as data; headers become `col0`, `col1`, ...
    pub fn without_headers(mut self) -> Self {
        self.has_headers = false;
        self
    }

    fn parse_comma(&self, path: &Path, content: &str) -> Result<RowSet, ParseError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ParseError::new(path, e.to_string()))?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        self.assemble(path, records)
    }

    fn parse_whitespace(&self, path: &Path, content: &str) -> Result<RowSet, ParseError> {
        let records = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect();
        self.assemble(path, records)
    }

    fn assemble(&self, path: &Path, mut records: Vec<Vec<String>>) -> Result<RowSet, ParseError> {
        if records.is_empty() {
            return Err(ParseError::new(path, "no rows"));
        }

        let headers = if self.has_headers {
            records.remove(0)
        } else {
            (0..records[0].len()).map(|i| format!("col{}", i)).collect()
        };

        // line numbers are 1-based and count the header
        let offset = if self.has_headers { 2 } else { 1 };
        for (i, row) in records.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(ParseError::new(
                    path,
                    format!(
                        "row {} has {} fields, expected {}",
                        i + offset,
                        row.len(),
                        headers.len()
                    ),
                ));
            }
        }

        Ok(RowSet::new(headers, records))
    }
}

impl TabularParser for DelimitedParser {
    fn parse(&self, path: &Path) -> Result<RowSet, ParseError> {
        let content = fs::read_to_string(path).map_err(|e| ParseError::new(path, e.to_string()))?;
        let first_line = content.lines().map(str::trim).find(|line| !line.is_empty());

        match first_line {
            None => Err(ParseError::new(path, "empty file")),
            Some(line) if line.contains(',') => self.parse_comma(path, &content),
            Some(_) => self.parse_whitespace(path, &content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(content: &str) -> Result<RowSet, ParseError> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, content).unwrap();
        DelimitedParser::new().parse(&path)
    }

    #[test]
    fn test_comma_delimited() {
        let rows = parse("x,y,loss\n1,2,0.5\n3,4,0.25\n").unwrap();
        assert_eq!(rows.headers, vec!["x", "y", "loss"]);
        assert_eq!(rows.rows, vec![vec!["1", "2", "0.5"], vec!["3", "4", "0.25"]]);
    }

    #[test]
    fn test_comma_with_padding_and_blank_lines() {
        let rows = parse("x , y\n\n 1, 2 \n").unwrap();
        assert_eq!(rows.headers, vec!["x", "y"]);
        assert_eq!(rows.rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn test_quoted_comma_field() {
        let rows = parse("label,value\n\"a,b\",1\n").unwrap();
        assert_eq!(rows.rows[0][0], "a,b");
    }

    #[test]
    fn test_whitespace_delimited() {
        let rows = parse("x   y\tloss\n1 2 0.5\n").unwrap();
        assert_eq!(rows.headers, vec!["x", "y", "loss"]);
        assert_eq!(rows.column_f64("loss"), Some(vec![0.5]));
    }

    #[test]
    fn test_header_only() {
        let rows = parse("x,y\n").unwrap();
        assert!(rows.is_empty());
        assert_eq!(rows.headers.len(), 2);
    }

    #[test]
    fn test_empty_file_is_error() {
        let err = parse("\n\n").unwrap_err();
        assert_eq!(err.message, "empty file");
    }

    #[test]
    fn test_ragged_row_is_error() {
        let err = parse("a b c\n1 2\n").unwrap_err();
        assert!(err.message.contains("row 2 has 2 fields, expected 3"));
    }

    #[test]
    fn test_without_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.txt");
        fs::write(&path, "1 2\n3 4\n").unwrap();

        let rows = DelimitedParser::new().without_headers().parse(&path).unwrap();
        assert_eq!(rows.headers, vec!["col0", "col1"]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = DelimitedParser::new().parse(Path::new("/nonexistent/out.csv")).unwrap_err();
        assert_eq!(err.path, Path::new("/nonexistent/out.csv"));
    }
}
