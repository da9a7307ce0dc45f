//! CLI argument parsing for keju.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keju: validates a submitted C++ project against its seed project.
///
/// A submission passes when its files respect the path policy, it builds,
/// its unit tests pass with enough coverage, and the compiled program
/// reproduces the golden output.
#[derive(Parser, Debug)]
#[command(name = "keju")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log filter for diagnostics on stderr (e.g. "debug", "keju=trace").
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for keju.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full validation pipeline.
    ///
    /// Checks the project structure, builds it, runs the unit tests and
    /// coverage, then compares the program output with the golden files.
    /// Stops at the first failing stage.
    Validate(ValidateArgs),

    /// Compare the project tree with the seed tree.
    ///
    /// Prints added, changed and deleted files. With `--validation`, the
    /// path policy from validation.json is applied as well.
    Compare(CompareArgs),
}

/// Arguments for the `validate` command.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Root folder of the submitted project.
    #[arg(short, long)]
    pub project: PathBuf,

    /// Root folder of the seed project.
    #[arg(short, long)]
    pub seed: PathBuf,

    /// Folder holding validation.json and the golden files.
    #[arg(short, long)]
    pub validation: PathBuf,
}

/// Arguments for the `compare` command.
#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Root folder of the submitted project.
    #[arg(short, long)]
    pub project: PathBuf,

    /// Root folder of the seed project.
    #[arg(short, long)]
    pub seed: PathBuf,

    /// Folder holding validation.json; enables the path policy.
    #[arg(short, long)]
    pub validation: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_validate_long_flags() {
        let cli = Cli::try_parse_from([
            "keju",
            "validate",
            "--project",
            "work/submission",
            "--seed",
            "seed",
            "--validation",
            "golden",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "info");
        if let Command::Validate(args) = cli.command {
            assert_eq!(args.project, PathBuf::from("work/submission"));
            assert_eq!(args.seed, PathBuf::from("seed"));
            assert_eq!(args.validation, PathBuf::from("golden"));
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn parse_validate_short_flags() {
        let cli =
            Cli::try_parse_from(["keju", "validate", "-p", "proj", "-s", "seed", "-v", "val"])
                .unwrap();
        if let Command::Validate(args) = cli.command {
            assert_eq!(args.project, PathBuf::from("proj"));
            assert_eq!(args.validation, PathBuf::from("val"));
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn parse_validate_requires_validation_folder() {
        let result = Cli::try_parse_from(["keju", "validate", "-p", "proj", "-s", "seed"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_compare_without_policy() {
        let cli = Cli::try_parse_from(["keju", "compare", "-p", "proj", "-s", "seed"]).unwrap();
        if let Command::Compare(args) = cli.command {
            assert!(args.validation.is_none());
        } else {
            panic!("Expected Compare command");
        }
    }

    #[test]
    fn parse_global_log_level_after_subcommand() {
        let cli = Cli::try_parse_from([
            "keju",
            "compare",
            "-p",
            "proj",
            "-s",
            "seed",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
    }
}
