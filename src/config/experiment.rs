//! Experiment configuration.
//!
//! An `ExperimentConfig` is built once by the caller (or loaded from YAML by
//! the binary) and shared read-only by every job of a step.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Result, SweeprError};

/// Default base name for per-job stdout files.
pub const DEFAULT_STDOUT_BASENAME: &str = "output";

/// Default extension of result files.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "csv";

/// Where result files are collected from after a batch completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionScope {
    /// Flat listing of the experiment's source directory.
    #[default]
    SourceDir,
    /// Each job's working directory of the current step, in job order.
    JobDirs,
}

/// Ordered command-line flag/value pairs.
///
/// Insertion order is significant: it is the order flags appear on the
/// command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Mapping", into = "Mapping")]
pub struct Arguments {
    pairs: Vec<(String, String)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a flag/value pair. Re-inserting a flag replaces its value in place.
    pub fn insert(&mut self, flag: impl Into<String>, value: impl fmt::Display) {
        let flag = flag.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(f, _)| *f == flag) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((flag, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn get(&self, flag: &str) -> Option<&str> {
        self.pairs.iter().find(|(f, _)| f == flag).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl TryFrom<Mapping> for Arguments {
    type Error = String;

    fn try_from(mapping: Mapping) -> std::result::Result<Self, Self::Error> {
        let mut args = Arguments::new();
        for (key, value) in mapping {
            let flag = scalar_to_string(&key).ok_or_else(|| format!("argument flag must be a scalar: {:?}", key))?;
            let value = scalar_to_string(&value)
                .ok_or_else(|| format!("argument '{}' must have a scalar value", flag))?;
            args.insert(flag, value);
        }
        Ok(args)
    }
}

impl From<Arguments> for Mapping {
    fn from(args: Arguments) -> Self {
        args.pairs
            .into_iter()
            .map(|(f, v)| (Value::String(f), Value::String(v)))
            .collect()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Immutable description of one experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExperimentConfig {
    /// Prefix for job names; the job index is appended.
    pub name: String,

    /// First token of every job's command line.
    pub program_name: String,

    /// Ordered flag/value pairs following the program name.
    #[serde(default)]
    pub arguments: Arguments,

    /// Root of the experiment; results are collected from here.
    pub source_dir: PathBuf,

    /// Directory under `source_dir` holding the `step<N>/job<M>` tree.
    pub output_dir: PathBuf,

    /// Extension of result files produced by jobs.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Base name of the per-job stdout file (`<base><index>.txt`).
    #[serde(default = "default_stdout_basename")]
    pub stdout_basename: String,

    /// Executable handed to the scheduler; defaults to `program_name`.
    #[serde(default)]
    pub executor: Option<String>,

    #[serde(default)]
    pub collection: CollectionScope,
}

fn default_output_extension() -> String {
    DEFAULT_OUTPUT_EXTENSION.to_string()
}

fn default_stdout_basename() -> String {
    DEFAULT_STDOUT_BASENAME.to_string()
}

impl ExperimentConfig {
    /// Create a config with default extension, stdout name and collection scope.
    pub fn new(
        name: impl Into<String>,
        program_name: impl Into<String>,
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            program_name: program_name.into(),
            arguments: Arguments::new(),
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            output_extension: default_output_extension(),
            stdout_basename: default_stdout_basename(),
            executor: None,
            collection: CollectionScope::default(),
        }
    }

    /// Append a command-line flag and its value.
    pub fn with_arg(mut self, flag: impl Into<String>, value: impl fmt::Display) -> Self {
        self.arguments.insert(flag, value);
        self
    }

    pub fn with_output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    pub fn with_stdout_basename(mut self, basename: impl Into<String>) -> Self {
        self.stdout_basename = basename.into();
        self
    }

    pub fn with_executor(mut self, executor: impl Into<String>) -> Self {
        self.executor = Some(executor.into());
        self
    }

    pub fn with_collection(mut self, scope: CollectionScope) -> Self {
        self.collection = scope;
        self
    }

    /// Executable handed to the scheduler.
    pub fn executable(&self) -> &str {
        self.executor.as_deref().unwrap_or(&self.program_name)
    }

    /// Root of the `step<N>/job<M>` tree.
    pub fn output_root(&self) -> PathBuf {
        self.source_dir.join(&self.output_dir)
    }

    /// Check the fields every job depends on.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SweeprError::Config("name must not be empty".into()));
        }
        if self.program_name.is_empty() {
            return Err(SweeprError::Config("program-name must not be empty".into()));
        }
        if self.output_extension.trim_start_matches('.').is_empty() {
            return Err(SweeprError::Config("output-extension must not be empty".into()));
        }
        if self.stdout_basename.is_empty() {
            return Err(SweeprError::Config("stdout-basename must not be empty".into()));
        }
        if self.output_dir.is_absolute() {
            return Err(SweeprError::Config(format!(
                "output-dir must be relative to source-dir, got {}",
                self.output_dir.display()
            )));
        }
        Ok(())
    }

    /// Resolve a relative `source_dir` against `root`.
    pub fn resolved_against(mut self, root: &Path) -> Self {
        if self.source_dir.is_relative() {
            self.source_dir = root.join(&self.source_dir);
        }
        self
    }

    /// Load from YAML. A relative `source-dir` is resolved against the file's directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SweeprError::filesystem(path, e))?;
        let config: Self = serde_yaml::from_str(&content)?;
        let root = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let config = config.resolved_against(root);
        config.validate()?;
        log::info!("Loaded experiment '{}' from {}", config.name, path.display());
        Ok(config)
    }
}
