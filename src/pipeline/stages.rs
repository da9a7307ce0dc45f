//! Individual pipeline stages.
//!
//! Each stage returns a short success message or the error that rejects the
//! submission. Stages that run commands inside the build folder enter it
//! through a [`WorkingDirectoryStack`] scope, so the previous directory is
//! restored on every exit path.

use crate::config::ValidationConfig;
use crate::coverage::{CoverageReportParser, check_threshold};
use crate::error::{KejuError, Result};
use crate::functional::FunctionalComparator;
use crate::paths::ProjectPaths;
use crate::process::{OutputSink, ProcessRunner};
use crate::structure::{TreeDiffer, evaluate_policy};
use crate::workdir::WorkingDirectoryStack;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Compare the submission tree against the seed and apply the path policy.
pub fn structure_check(paths: &ProjectPaths, config: &ValidationConfig) -> Result<String> {
    let diff = TreeDiffer::new().diff(&paths.test_project_root, &paths.seed_project_root);
    for note in &diff.diagnostics {
        println!("WARN: {}", note);
    }

    let verdict = evaluate_policy(&diff, config);
    print!("{}", verdict.format_report());

    if verdict.passed {
        Ok(format!(
            "{} added, {} changed, {} deleted",
            verdict.added.len(),
            verdict.changed.len(),
            verdict.missing.len()
        ))
    } else {
        let forbidden: Vec<&str> = verdict.violations.iter().map(|v| v.path.as_str()).collect();
        Err(KejuError::StructuralViolation(format!(
            "forbidden paths were changed or deleted: {}\n\
             Fix: restore these files from the seed project.",
            forbidden.join(", ")
        )))
    }
}

/// Recreate the build folder and run the build commands inside it.
pub fn build(
    paths: &ProjectPaths,
    config: &ValidationConfig,
    runner: &ProcessRunner,
    dirs: &mut WorkingDirectoryStack,
) -> Result<String> {
    let build_dir = config.build_dir(&paths.test_project_root);
    if build_dir.is_dir() {
        fs::remove_dir_all(&build_dir)
            .map_err(|e| KejuError::io("remove build folder", &build_dir, e))?;
    }
    fs::create_dir_all(&build_dir).map_err(|e| KejuError::io("create build folder", &build_dir, e))?;

    let _scope = dirs.enter(&build_dir)?;
    for command in &config.build_commands {
        let outcome = runner.run_inherited(command);
        if !outcome.is_success() {
            return Err(KejuError::ProcessFailure(format!(
                "build failed: {}",
                outcome.failure_reason()
            )));
        }
    }

    Ok(format!("{} build command(s) succeeded", config.build_commands.len()))
}

/// Run the unit test command inside the build folder.
pub fn unit_test(
    paths: &ProjectPaths,
    config: &ValidationConfig,
    runner: &ProcessRunner,
    dirs: &mut WorkingDirectoryStack,
) -> Result<String> {
    let build_dir = ensure_build_dir(paths, config)?;
    let _scope = dirs.enter(&build_dir)?;

    let outcome = runner.run_inherited(&config.unittest_cmd);
    if !outcome.is_success() {
        return Err(KejuError::ProcessFailure(format!(
            "unit test failed: {}",
            outcome.failure_reason()
        )));
    }

    Ok(format!("'{}' passed", config.unittest_cmd))
}

/// Run the coverage command, check its summary and the unit test report.
pub fn coverage(
    paths: &ProjectPaths,
    config: &ValidationConfig,
    runner: &ProcessRunner,
    parser: &dyn CoverageReportParser,
    dirs: &mut WorkingDirectoryStack,
) -> Result<String> {
    let build_dir = ensure_build_dir(paths, config)?;
    let report_path = config.unittest_report_path(&paths.test_project_root);
    let _scope = dirs.enter(&build_dir)?;

    // A report left over from an earlier run must not count as evidence.
    remove_report(&report_path)?;

    let outcome = runner.run(&config.coverage_cmd, OutputSink::Capture, OutputSink::Inherit);
    let text = outcome.stdout.clone().unwrap_or_default();
    print!("{}", text);
    if !outcome.is_success() {
        return Err(KejuError::ProcessFailure(format!(
            "coverage run failed: {}",
            outcome.failure_reason()
        )));
    }

    let report_present = report_path.is_file();
    if report_present && let Err(e) = remove_report(&report_path) {
        warn!(error = %e, "could not remove unit test report");
    }

    let summary = parser.parse(&text).ok_or_else(|| {
        KejuError::CoverageParseFailure(format!(
            "no TOTAL line with a percentage in the output of '{}'",
            config.coverage_cmd
        ))
    })?;
    debug!(
        line_percent = summary.line_percent,
        min_func_rate = config.coverage_min_func_rate,
        "coverage summary parsed"
    );

    if !check_threshold(&summary, config.coverage_min_line_rate) {
        return Err(KejuError::ThresholdViolation(format!(
            "line coverage is {}%, the expected rate is >= {}%",
            summary.line_percent, config.coverage_min_line_rate
        )));
    }

    if !report_present {
        return Err(KejuError::CoverageParseFailure(format!(
            "failed to find the unit test report '{}'",
            report_path.display()
        )));
    }

    if !config.coverage_html_cmd.trim().is_empty() {
        let html = runner.run_inherited(&config.coverage_html_cmd);
        if !html.is_success() {
            warn!(reason = %html.failure_reason(), "coverage HTML report was not generated");
        }
    }

    Ok(format!(
        "line coverage {}% (minimum {}%)",
        summary.line_percent, config.coverage_min_line_rate
    ))
}

/// Run the built program against the golden input/output files.
pub fn functional(
    paths: &ProjectPaths,
    config: &ValidationConfig,
    runner: &ProcessRunner,
) -> Result<String> {
    let executable = config.executable_path(&paths.test_project_root);
    let tally = FunctionalComparator::new(runner).compare(
        &executable,
        Path::new(&config.functional_input),
        Path::new(&config.functional_output),
    )?;

    println!("Test result: {}/{} passed.", tally.passed, tally.total());

    if tally.is_pass() {
        Ok(format!("{}/{} cases passed", tally.passed, tally.total()))
    } else {
        Err(KejuError::FunctionalMismatch(format!(
            "{} of {} cases produced unexpected output",
            tally.failed,
            tally.total()
        )))
    }
}

fn ensure_build_dir(paths: &ProjectPaths, config: &ValidationConfig) -> Result<std::path::PathBuf> {
    let build_dir = config.build_dir(&paths.test_project_root);
    fs::create_dir_all(&build_dir).map_err(|e| KejuError::io("create build folder", &build_dir, e))?;
    Ok(build_dir)
}

fn remove_report(path: &Path) -> Result<()> {
    if path.is_file() {
        fs::remove_file(path).map_err(|e| KejuError::io("remove unit test report", path, e))?;
    }
    Ok(())
}
