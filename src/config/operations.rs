//! Config loading, validation, and utility operations.

use super::model::ValidationConfig;
use super::types::CONFIG_FILE_NAME;
use crate::error::{KejuError, Result};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

impl ValidationConfig {
    /// Load config from `<validation_folder>/validation.json`.
    ///
    /// The golden input/output paths are resolved against the validation
    /// folder, so the returned config can be used from any working directory.
    ///
    /// # Returns
    ///
    /// * `Ok(ValidationConfig)` - Successfully loaded and validated config
    /// * `Err(KejuError::ConfigError)` - Missing folder/file, parse error or validation failure
    pub fn load<P: AsRef<Path>>(validation_folder: P) -> Result<Self> {
        let folder = validation_folder.as_ref();

        if !folder.is_dir() {
            return Err(KejuError::ConfigError(format!(
                "validation folder '{}' doesn't exist.",
                folder.display()
            )));
        }

        let path = folder.join(CONFIG_FILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            KejuError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_json(&content)?;
        config.functional_input = resolve_against(folder, &config.functional_input);
        config.functional_output = resolve_against(folder, &config.functional_output);
        Ok(config)
    }

    /// Parse config from a JSON string.
    ///
    /// Unknown keys are silently ignored for forward compatibility.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ValidationConfig = serde_json::from_str(json)
            .map_err(|e| KejuError::ConfigError(format!("failed to parse config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `executable`, `functional_input` and `functional_output` are required
    /// - `build_folder` must be a subfolder of the project root
    /// - `build_commands` must be non-empty and contain no blank command
    /// - coverage rates are percentages in `0..=100`
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("executable", &self.executable),
            ("functional_input", &self.functional_input),
            ("functional_output", &self.functional_output),
        ] {
            if value.trim().is_empty() {
                return Err(KejuError::ConfigError(format!(
                    "required key '{}' is missing from {}.",
                    key, CONFIG_FILE_NAME
                )));
            }
        }

        // The build stage deletes this folder, so it must name a real subfolder.
        let build_folder = Path::new(self.build_folder.trim());
        let has_named_component = build_folder
            .components()
            .any(|c| matches!(c, Component::Normal(_)));
        let escapes = build_folder.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if !has_named_component || escapes {
            return Err(KejuError::ConfigError(format!(
                "config validation failed: build_folder must be a subfolder of the project (found '{}')",
                self.build_folder
            )));
        }

        if self.build_commands.is_empty() {
            return Err(KejuError::ConfigError(
                "config validation failed: build_commands must list at least one command"
                    .to_string(),
            ));
        }
        if self.build_commands.iter().any(|c| c.trim().is_empty()) {
            return Err(KejuError::ConfigError(
                "config validation failed: build_commands entries must be non-empty".to_string(),
            ));
        }

        for (key, rate) in [
            ("coverage_min_line_rate", self.coverage_min_line_rate),
            ("coverage_min_func_rate", self.coverage_min_func_rate),
        ] {
            if rate > 100 {
                return Err(KejuError::ConfigError(format!(
                    "config validation failed: {} must be between 0 and 100 (found {})",
                    key, rate
                )));
            }
        }

        if self.command_timeout_secs == Some(0) {
            return Err(KejuError::ConfigError(
                "config validation failed: command_timeout_secs must be greater than 0"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Timeout applied to every external command, if configured.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Absolute build folder for the given project root.
    pub fn build_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.build_folder)
    }

    /// Absolute path to the compiled program for the given project root.
    pub fn executable_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.executable)
    }

    /// Absolute path to the unit test XML report for the given project root.
    pub fn unittest_report_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.unittest_xml_output)
    }
}

fn resolve_against(base: &Path, relative: &str) -> String {
    let path = Path::new(relative);
    if path.is_absolute() {
        relative.to_string()
    } else {
        base.join(path).to_string_lossy().into_owned()
    }
}
