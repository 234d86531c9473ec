//! Parameter points and step counters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of one iteration of the submit -> collect -> propose loop.
pub type Step = u32;

/// One candidate parameter vector.
///
/// A point's identity is its position in the batch it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataPoint(Vec<f64>);

impl DataPoint {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for DataPoint {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Comma-joined values, as exported to jobs.
impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}
