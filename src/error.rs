//! Error types for Sweepr
//!
//! Centralized error handling using thiserror. Step-level failures abort the
//! current step; per-file and per-job failures travel inside the results of
//! the operation that produced them.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur in Sweepr
#[derive(Debug, Error)]
pub enum SweeprError {
    /// Malformed experiment configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Directory creation or listing failed
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scheduler session could not be opened/closed or failed systemically
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// A single output file could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The point-generation collaborator failed
    #[error("Point generation error: {0}")]
    PointGeneration(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Step journal is unreadable or inconsistent
    #[error("Journal error: {0}")]
    Journal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SweeprError {
    /// Wrap an IO error with the path it happened at.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether re-running the same step can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Filesystem { .. } | Self::Scheduler(_))
    }
}

/// Failure to parse one result file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error in {}: {message}", path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
}

impl ParseError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Sweepr operations
pub type Result<T> = std::result::Result<T, SweeprError>;
