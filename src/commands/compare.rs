//! Implementation of the `keju compare` command.
//!
//! Runs only the structure check: the tree diff, plus the path policy when a
//! validation folder is given. Nothing is built or executed.

use crate::cli::CompareArgs;
use crate::config::ValidationConfig;
use crate::error::{KejuError, Result};
use crate::paths::ProjectPaths;
use crate::structure::{TreeDiffer, evaluate_policy};

/// Execute the `keju compare` command.
pub fn cmd_compare(args: CompareArgs) -> Result<()> {
    // Without a validation folder every difference is informational.
    let config = match &args.validation {
        Some(folder) => ValidationConfig::load(folder)?,
        None => ValidationConfig::default(),
    };

    let paths = ProjectPaths::new(args.project, args.seed).resolve()?;
    let diff = TreeDiffer::new().diff(&paths.test_project_root, &paths.seed_project_root);
    for note in &diff.diagnostics {
        println!("WARN: {}", note);
    }

    let verdict = evaluate_policy(&diff, &config);
    print!("{}", verdict.format_report());

    if diff.is_identical() {
        println!("The project matches the seed.");
    }

    if verdict.passed {
        Ok(())
    } else {
        Err(KejuError::StructuralViolation(format!(
            "{} forbidden path(s) were changed or deleted",
            verdict.violations.len()
        )))
    }
}
