//! ValidationConfig struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration for one validation run.
///
/// This struct represents the contents of `<validation folder>/validation.json`.
/// Unknown keys in the JSON are ignored for forward compatibility. Every
/// path is relative to the test project root unless noted otherwise, and
/// structure paths are compared as opaque strings of the form `./dir/file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    // =========================================================================
    // Required
    // =========================================================================
    /// Path to the compiled program, relative to the test project root.
    pub executable: String,

    /// Golden input file (one case per line). Relative to the validation folder.
    pub functional_input: String,

    /// Golden output file (one expected line per case). Relative to the validation folder.
    pub functional_output: String,

    // =========================================================================
    // Build settings
    // =========================================================================
    /// Build folder, destructively recreated by the build stage.
    #[serde(default = "default_build_folder")]
    pub build_folder: String,

    /// Shell commands run in order inside the build folder.
    #[serde(default = "default_build_commands")]
    pub build_commands: Vec<String>,

    /// Kill any external command that runs longer than this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    // =========================================================================
    // Unit test and coverage settings
    // =========================================================================
    /// Machine-readable unit test report that must exist after the coverage run.
    #[serde(default = "default_unittest_xml_output")]
    pub unittest_xml_output: String,

    #[serde(default = "default_unittest_cmd")]
    pub unittest_cmd: String,

    /// Command whose stdout carries the `TOTAL ... NN%` summary line.
    #[serde(default = "default_coverage_cmd")]
    pub coverage_cmd: String,

    /// Command producing the browsable coverage report (empty disables).
    #[serde(default = "default_coverage_html_cmd")]
    pub coverage_html_cmd: String,

    #[serde(default = "default_min_rate")]
    pub coverage_min_line_rate: u32,

    /// Accepted for compatibility; the text report carries no function total.
    #[serde(default = "default_min_rate")]
    pub coverage_min_func_rate: u32,

    // =========================================================================
    // Structure policy
    // =========================================================================
    /// Changed files that are expected and never reported as violations.
    pub ignored_different_files: BTreeSet<String>,

    /// Files the submission must not change.
    pub forbidden_different_files: BTreeSet<String>,

    /// Seed files the submission may delete.
    pub ignored_missing_files: BTreeSet<String>,

    /// Seed files the submission must not delete.
    pub forbidden_missing_files: BTreeSet<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            executable: String::new(),
            functional_input: String::new(),
            functional_output: String::new(),
            build_folder: default_build_folder(),
            build_commands: default_build_commands(),
            command_timeout_secs: None,
            unittest_xml_output: default_unittest_xml_output(),
            unittest_cmd: default_unittest_cmd(),
            coverage_cmd: default_coverage_cmd(),
            coverage_html_cmd: default_coverage_html_cmd(),
            coverage_min_line_rate: default_min_rate(),
            coverage_min_func_rate: default_min_rate(),
            ignored_different_files: BTreeSet::new(),
            forbidden_different_files: BTreeSet::new(),
            ignored_missing_files: BTreeSet::new(),
            forbidden_missing_files: BTreeSet::new(),
        }
    }
}
