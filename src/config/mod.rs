//! Configuration system for Sweepr.
//!
//! Two layers:
//! 1. Experiment config (what to run): program, flags, directory layout
//! 2. Global config (how to run it): scheduler parallelism, step limits

pub use self::experiment::{
    Arguments, CollectionScope, DEFAULT_OUTPUT_EXTENSION, DEFAULT_STDOUT_BASENAME, ExperimentConfig,
};
pub use self::global::{GlobalConfig, RunConfig, SchedulerConfig};

mod experiment;
mod global;

use eyre::Result;
use std::path::PathBuf;

/// Load global configuration from the standard search paths.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .sweepr.yml in current directory (project config)
/// 3. ~/.config/sweepr/sweepr.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<GlobalConfig> {
    GlobalConfig::load(explicit_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_default() {
        // Should succeed with defaults when no config file exists
        let config = load_config(None).unwrap();
        assert!(config.scheduler.max_parallel > 0);
    }
}
