//! Implementation of the `keju validate` command.
//!
//! Loads `validation.json`, runs every pipeline stage against the
//! submission and prints the run summary. The error of the failing stage
//! becomes the command's error, which selects the exit code.

use crate::cli::ValidateArgs;
use crate::config::ValidationConfig;
use crate::error::Result;
use crate::paths::ProjectPaths;
use crate::pipeline::{ValidationPipeline, format_summary};
use tracing::info;

/// Execute the `keju validate` command.
///
/// # Exit Codes
///
/// - 0: All stages passed
/// - 1: A stage rejected the submission
/// - 2: User error (missing folders, unreadable or invalid configuration)
pub fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let config = ValidationConfig::load(&args.validation)?;
    info!(
        project = %args.project.display(),
        seed = %args.seed.display(),
        validation = %args.validation.display(),
        "starting validation"
    );

    let paths = ProjectPaths::new(args.project, args.seed);
    let report = ValidationPipeline::new(paths, config).run();

    println!();
    print!("{}", format_summary(&report));

    report.into_result()
}
