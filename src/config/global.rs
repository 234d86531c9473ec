//! Global configuration.
//!
//! Loaded from an explicit path, .sweepr.yml or ~/.config/sweepr/sweepr.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Global configuration for Sweepr.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Local scheduler settings.
    pub scheduler: SchedulerConfig,

    /// Multi-step run settings.
    pub run: RunConfig,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .sweepr.yml in current directory
    /// 3. ~/.config/sweepr/sweepr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".sweepr.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .sweepr.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .sweepr.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sweepr").join("sweepr.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.max_parallel == 0 {
            eyre::bail!("scheduler.max-parallel must be > 0");
        }
        if self.run.max_steps == Some(0) {
            eyre::bail!("run.max-steps must be > 0 when set");
        }
        Ok(())
    }
}

/// Settings for the local process scheduler.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum jobs running at once.
    #[serde(rename = "max-parallel")]
    pub max_parallel: usize,

    /// Per-job timeout in milliseconds; no limit when absent.
    #[serde(rename = "job-timeout-ms")]
    pub job_timeout_ms: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            job_timeout_ms: None,
        }
    }
}

/// Settings for the multi-step driver.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop after this many steps even if the generator keeps proposing.
    #[serde(rename = "max-steps")]
    pub max_steps: Option<u32>,

    /// Append a step record to journal.jsonl after every step.
    pub journal: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(10),
            journal: true,
        }
    }
}
