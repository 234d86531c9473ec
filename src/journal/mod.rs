//! Step journal.
//!
//! One JSON line per completed cycle, written after the step's dataset was
//! collected. The last line is the resume point.

mod record;
mod store;

pub use record::{StepRecord, config_fingerprint};
pub use store::{JOURNAL_FILENAME, StepJournal};
