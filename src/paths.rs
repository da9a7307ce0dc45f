//! The two project trees a validation run works on.

use crate::error::{KejuError, Result};
use std::path::{Path, PathBuf};

/// Submission and seed project roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// The submitted project (left side of the structure diff).
    pub test_project_root: PathBuf,
    /// The reference project (right side of the structure diff).
    pub seed_project_root: PathBuf,
}

impl ProjectPaths {
    pub fn new(test_project_root: impl Into<PathBuf>, seed_project_root: impl Into<PathBuf>) -> Self {
        Self {
            test_project_root: test_project_root.into(),
            seed_project_root: seed_project_root.into(),
        }
    }

    /// Check both roots are directories and make them absolute.
    ///
    /// Later stages change the working directory, so relative roots must be
    /// resolved before the first change.
    pub fn resolve(&self) -> Result<Self> {
        Ok(Self {
            test_project_root: absolute_dir(&self.test_project_root)?,
            seed_project_root: absolute_dir(&self.seed_project_root)?,
        })
    }
}

fn absolute_dir(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(KejuError::UserError(format!(
            "{} is not a valid folder!",
            path.display()
        )));
    }
    std::path::absolute(path).map_err(|e| KejuError::io("resolve", path, e))
}
