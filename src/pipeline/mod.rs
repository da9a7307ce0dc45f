//! The validation pipeline.
//!
//! Stages run in a fixed order and the first failure ends the run:
//!
//! 1. Init: check both project roots and make them absolute
//! 2. Structure check: diff against the seed and apply the path policy
//! 3. Build: recreate the build folder and run the build commands
//! 4. Unit test: run the unit test command
//! 5. Coverage: run the coverage command and check its summary
//! 6. Functional validation: compare program output with golden data
//!
//! Stages after a failure are recorded as skipped and never executed. A run
//! always starts from Init; there is no resumption.

mod report;
pub mod stages;


use crate::config::ValidationConfig;
use crate::coverage::{CoverageReportParser, TotalLineParser};
use crate::error::{KejuError, Result};
use crate::paths::ProjectPaths;
use crate::process::ProcessRunner;
use crate::workdir::WorkingDirectoryStack;
use tracing::{error, info};

pub use report::format_summary;

/// A pipeline state. `Done` is reached only when every stage passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    StructureCheck,
    Build,
    UnitTest,
    Coverage,
    FunctionalValidation,
    Done,
}

impl Stage {
    /// Stages that do work, in execution order.
    pub const SEQUENCE: [Stage; 6] = [
        Stage::Init,
        Stage::StructureCheck,
        Stage::Build,
        Stage::UnitTest,
        Stage::Coverage,
        Stage::FunctionalValidation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::StructureCheck => "structure",
            Stage::Build => "build",
            Stage::UnitTest => "unit test",
            Stage::Coverage => "coverage",
            Stage::FunctionalValidation => "functional",
            Stage::Done => "done",
        }
    }

    fn banner(&self) -> &'static str {
        match self {
            Stage::Init => "Basic check",
            Stage::StructureCheck => "Check the project files",
            Stage::Build => "Build",
            Stage::UnitTest => "Unit test",
            Stage::Coverage => "Check code coverage from unit test",
            Stage::FunctionalValidation => "Extended input validation",
            Stage::Done => "Done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Status of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pass,
    Fail,
    Skip,
}

/// Result of a single stage.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    pub message: Option<String>,
}

impl StageResult {
    pub fn pass(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Pass,
            message: Some(message.into()),
        }
    }

    pub fn fail(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Fail,
            message: Some(message.into()),
        }
    }

    pub fn skip(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skip,
            message: Some(message.into()),
        }
    }
}

/// Everything a run produced: one result per stage and the first failure.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub results: Vec<StageResult>,
    failure: Option<(Stage, KejuError)>,
}

impl PipelineReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    /// Where the run stopped: the failing stage, or `Done`.
    pub fn final_stage(&self) -> Stage {
        self.failure
            .as_ref()
            .map(|(stage, _)| *stage)
            .unwrap_or(Stage::Done)
    }

    /// The stage that failed, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.failure.as_ref().map(|(stage, _)| *stage)
    }

    pub fn status_of(&self, stage: Stage) -> Option<StageStatus> {
        self.results
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.status)
    }

    /// Convert into the error of the failing stage.
    pub fn into_result(self) -> Result<()> {
        match self.failure {
            None => Ok(()),
            Some((_, err)) => Err(err),
        }
    }
}

/// One validation run over a submission.
pub struct ValidationPipeline {
    paths: ProjectPaths,
    config: ValidationConfig,
    runner: ProcessRunner,
    coverage_parser: Box<dyn CoverageReportParser>,
}

impl ValidationPipeline {
    pub fn new(paths: ProjectPaths, config: ValidationConfig) -> Self {
        let runner = ProcessRunner::with_timeout(config.command_timeout());
        Self {
            paths,
            config,
            runner,
            coverage_parser: Box::new(TotalLineParser),
        }
    }

    /// Replace the coverage text parser.
    pub fn with_coverage_parser(mut self, parser: Box<dyn CoverageReportParser>) -> Self {
        self.coverage_parser = parser;
        self
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// Holds the process working directory for the whole run.
    pub fn run(&self) -> PipelineReport {
        let mut dirs = WorkingDirectoryStack::new();
        let mut report = PipelineReport::default();
        let mut paths = self.paths.clone();

        for (index, stage) in Stage::SEQUENCE.into_iter().enumerate() {
            if let Some(failed) = report.failed_stage() {
                report.results.push(StageResult::skip(
                    stage,
                    format!("not run: {} failed", failed),
                ));
                continue;
            }

            println!("{}. {}...", index + 1, stage.banner());
            match self.run_stage(stage, &mut paths, &mut dirs) {
                Ok(message) => {
                    info!(stage = stage.name(), "stage passed");
                    report.results.push(StageResult::pass(stage, message));
                }
                Err(err) => {
                    error!(stage = stage.name(), error = %err, "stage failed");
                    report.results.push(StageResult::fail(stage, err.to_string()));
                    report.failure = Some((stage, err));
                }
            }
        }

        if report.passed() {
            println!("All passed. Congratulations!");
        }
        report
    }

    fn run_stage(
        &self,
        stage: Stage,
        paths: &mut ProjectPaths,
        dirs: &mut WorkingDirectoryStack,
    ) -> Result<String> {
        let config = &self.config;
        let runner = &self.runner;

        match stage {
            Stage::Init => {
                // A missing root rejects this run like any other stage.
                *paths = paths
                    .resolve()
                    .map_err(|e| KejuError::BasicCheckFailure(e.to_string()))?;
                Ok(format!(
                    "project {} against seed {}",
                    paths.test_project_root.display(),
                    paths.seed_project_root.display()
                ))
            }
            Stage::StructureCheck => stages::structure_check(paths, config),
            Stage::Build => stages::build(paths, config, runner, dirs),
            Stage::UnitTest => stages::unit_test(paths, config, runner, dirs),
            Stage::Coverage => {
                stages::coverage(paths, config, runner, self.coverage_parser.as_ref(), dirs)
            }
            Stage::FunctionalValidation => stages::functional(paths, config, runner),
            Stage::Done => Ok(String::new()),
        }
    }
}
