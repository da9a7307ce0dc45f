//! Error types for the keju CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for keju operations.
///
/// Each variant corresponds to one way a validation run can be rejected and
/// maps to an exit code in [`exit_codes`].
#[derive(Error, Debug)]
pub enum KejuError {
    /// User provided invalid arguments.
    #[error("{0}")]
    UserError(String),

    /// Validation configuration is missing, unreadable, or invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A project root given to a validation run is not a usable folder.
    #[error("Basic check failed: {0}")]
    BasicCheckFailure(String),

    /// A forbidden path was changed or deleted in the submission.
    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    /// An external command exited non-zero, timed out, or could not be launched.
    #[error("Process failure: {0}")]
    ProcessFailure(String),

    /// The coverage report had no usable TOTAL line, or the unit test report is missing.
    #[error("Coverage report error: {0}")]
    CoverageParseFailure(String),

    /// Coverage is below the configured minimum.
    #[error("Coverage threshold not met: {0}")]
    ThresholdViolation(String),

    /// One or more functional cases produced unexpected output.
    #[error("Functional mismatch: {0}")]
    FunctionalMismatch(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl KejuError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            KejuError::UserError(_) | KejuError::ConfigError(_) => exit_codes::USER_ERROR,
            KejuError::BasicCheckFailure(_)
            | KejuError::StructuralViolation(_)
            | KejuError::ProcessFailure(_)
            | KejuError::CoverageParseFailure(_)
            | KejuError::ThresholdViolation(_)
            | KejuError::FunctionalMismatch(_)
            | KejuError::IoError(_) => exit_codes::VALIDATION_FAILURE,
        }
    }

    /// Build an `IoError` that names the path being operated on.
    pub fn io(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        KejuError::IoError(format!("failed to {} '{}': {}", action, path.display(), err))
    }
}

/// Result type alias for keju operations.
pub type Result<T> = std::result::Result<T, KejuError>;
