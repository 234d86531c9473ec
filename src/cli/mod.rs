//! CLI module for sweepr - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
