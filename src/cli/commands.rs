//! CLI command definitions using clap.
//!
//! Subcommands:
//! - run: drive the sweep loop to completion
//! - plan: prepare one step and print the job specs
//! - collect: parse a directory of result files

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sweepr - parameter-sweep orchestration over a batch scheduler
#[derive(Parser, Debug)]
#[command(name = "sweepr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sweep loop until the generator stops or the step limit is hit
    Run {
        /// Experiment config (YAML)
        #[arg(short, long)]
        experiment: PathBuf,

        /// First batch: JSON array of points, inline or a file path
        #[arg(short, long)]
        points: String,

        /// Optimizer command; reads the dataset JSON on stdin, prints the next points
        #[arg(short, long)]
        generator: Option<String>,

        /// Override run.max-steps
        #[arg(short, long)]
        max_steps: Option<u32>,

        /// Continue from the experiment's journal
        #[arg(short, long)]
        resume: bool,
    },

    /// Prepare the directories for one step and print its job specs
    Plan {
        /// Experiment config (YAML)
        #[arg(short, long)]
        experiment: PathBuf,

        /// JSON array of points, inline or a file path
        #[arg(short, long)]
        points: String,

        /// Step number
        #[arg(short, long, default_value_t = 0)]
        step: u32,
    },

    /// Parse result files in a directory and summarize them
    Collect {
        /// Directory to scan
        #[arg(short, long)]
        dir: PathBuf,

        /// File extension to match
        #[arg(short = 'x', long, default_value = "csv")]
        extension: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["sweepr"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["sweepr", "collect", "-d", "out", "-v", "-c", "/etc/sweepr.yml"]).unwrap();
        assert!(cli.is_verbose());
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/etc/sweepr.yml")));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::try_parse_from([
            "sweepr",
            "run",
            "--experiment",
            "exp.yml",
            "--points",
            "[[1, 2]]",
            "--generator",
            "python3 opt.py",
            "--max-steps",
            "5",
            "--resume",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                experiment,
                points,
                generator,
                max_steps,
                resume,
            } => {
                assert_eq!(experiment, PathBuf::from("exp.yml"));
                assert_eq!(points, "[[1, 2]]");
                assert_eq!(generator.as_deref(), Some("python3 opt.py"));
                assert_eq!(max_steps, Some(5));
                assert!(resume);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["sweepr", "run", "-e", "exp.yml", "-p", "[[1]]"]).unwrap();
        match cli.command {
            Commands::Run {
                generator,
                max_steps,
                resume,
                ..
            } => {
                assert!(generator.is_none());
                assert!(max_steps.is_none());
                assert!(!resume);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_plan_command() {
        let cli = Cli::try_parse_from(["sweepr", "plan", "-e", "exp.yml", "-p", "[[1]]", "-s", "3"]).unwrap();
        match cli.command {
            Commands::Plan { step, .. } => assert_eq!(step, 3),
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_collect_default_extension() {
        let cli = Cli::try_parse_from(["sweepr", "collect", "--dir", "results"]).unwrap();
        match cli.command {
            Commands::Collect { dir, extension } => {
                assert_eq!(dir, PathBuf::from("results"));
                assert_eq!(extension, "csv");
            }
            _ => panic!("Expected Collect command"),
        }
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
