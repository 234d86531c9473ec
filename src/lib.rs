//! Sweepr - parameter-sweep orchestration over a batch scheduler
//!
//! Each step turns a batch of parameter points into jobs, one working
//! directory per job, runs the batch through a scheduler session, collects
//! the tabular results and asks a point generator for the next batch.

pub mod collector;
pub mod config;
pub mod domain;
pub mod error;
pub mod id;
pub mod jobs;
pub mod journal;
pub mod runner;
pub mod scheduler;

pub use error::{Result, SweeprError};
