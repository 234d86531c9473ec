//! Domain types for Sweepr
//!
//! This module contains all core domain types:
//! - DataPoint / Step: candidate parameter vectors and the iteration counter
//! - JobSpec: one fully-resolved unit of work for the scheduler
//! - JobOutcome / BatchReport: terminal state of jobs, in submission order
//! - RowSet / ResultDataset: parsed result files of one step

pub mod dataset;
pub mod job_spec;
pub mod outcome;
pub mod point;

pub use dataset::{DatasetEntry, ResultDataset, RowSet};
pub use job_spec::JobSpec;
pub use outcome::{BatchReport, JobOutcome};
pub use point::{DataPoint, Step};
