//! Job preparation.
//!
//! - command_line: experiment config -> argument vector
//! - directory: per-job working directories, created if absent
//! - spec_builder: one JobSpec per point, directories prepared up front

mod command_line;
mod directory;
mod spec_builder;

pub use command_line::build_command_line;
pub use directory::{ensure_job_dir, job_dir, step_dir};
pub use spec_builder::build_specs;

pub(crate) use directory::create_if_absent;
