//! Ignored/forbidden path policy applied to a tree diff.
//!
//! Rules:
//! - P1: changed files listed in `ignored_different_files` are dropped
//! - P2: missing files listed in `ignored_missing_files` are dropped
//! - P3: a remaining changed file listed in `forbidden_different_files` fails
//! - P4: a remaining missing file listed in `forbidden_missing_files` fails
//!
//! Files added by the submitter never fail validation.

use super::differ::DiffResult;
use crate::config::ValidationConfig;
use std::collections::BTreeSet;

/// Type of policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolationType {
    /// A file that must not change was changed (P3).
    ForbiddenChange,
    /// A file that must not be deleted is missing (P4).
    ForbiddenDeletion,
}

/// A single policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    /// Project-relative path (`./dir/file`).
    pub path: String,
    pub violation_type: PolicyViolationType,
}

/// Outcome of applying the policy to a diff.
#[derive(Debug, Clone)]
pub struct PolicyVerdict {
    /// Whether the structure check passed.
    pub passed: bool,
    /// Files the submitter added (informational).
    pub added: BTreeSet<String>,
    /// Changed files left after removing ignored ones.
    pub changed: BTreeSet<String>,
    /// Missing files left after removing ignored ones.
    pub missing: BTreeSet<String>,
    /// Forbidden hits (empty if passed).
    pub violations: Vec<PolicyViolation>,
}

impl PolicyVerdict {
    /// Format the verdict as a user-facing report.
    pub fn format_report(&self) -> String {
        let mut msg = String::new();

        msg.push_str(&format!("INFO: these files are added: {}\n", join(&self.added)));
        if !self.changed.is_empty() {
            msg.push_str(&format!(
                "WARN: these files are not expected to be changed: {}\n",
                join(&self.changed)
            ));
        }
        if !self.missing.is_empty() {
            msg.push_str(&format!(
                "WARN: these files are deleted: {}\n",
                join(&self.missing)
            ));
        }

        for violation in &self.violations {
            match violation.violation_type {
                PolicyViolationType::ForbiddenChange => msg.push_str(&format!(
                    "ERROR: {} is forbidden to be changed.\n",
                    violation.path
                )),
                PolicyViolationType::ForbiddenDeletion => msg.push_str(&format!(
                    "ERROR: {} is forbidden to be deleted.\n",
                    violation.path
                )),
            }
        }

        msg
    }
}

/// Apply the ignored/forbidden lists from `config` to `diff`.
///
/// `diff` is not modified; the filtered sets are built from it as a
/// snapshot, so every ignored entry is removed regardless of order.
pub fn evaluate_policy(diff: &DiffResult, config: &ValidationConfig) -> PolicyVerdict {
    let changed: BTreeSet<String> = diff
        .differing_files
        .iter()
        .filter(|path| !config.ignored_different_files.contains(*path))
        .cloned()
        .collect();

    let missing: BTreeSet<String> = diff
        .right_only_files
        .iter()
        .filter(|path| !config.ignored_missing_files.contains(*path))
        .cloned()
        .collect();

    let mut violations: Vec<PolicyViolation> = changed
        .iter()
        .filter(|path| config.forbidden_different_files.contains(*path))
        .map(|path| PolicyViolation {
            path: path.clone(),
            violation_type: PolicyViolationType::ForbiddenChange,
        })
        .collect();

    violations.extend(
        missing
            .iter()
            .filter(|path| config.forbidden_missing_files.contains(*path))
            .map(|path| PolicyViolation {
                path: path.clone(),
                violation_type: PolicyViolationType::ForbiddenDeletion,
            }),
    );

    PolicyVerdict {
        passed: violations.is_empty(),
        added: diff.left_only_files.clone(),
        changed,
        missing,
        violations,
    }
}

/// Pass/fail verdict of [`evaluate_policy`].
pub fn evaluate(diff: &DiffResult, config: &ValidationConfig) -> bool {
    evaluate_policy(diff, config).passed
}

fn join(paths: &BTreeSet<String>) -> String {
    let items: Vec<&str> = paths.iter().map(String::as_str).collect();
    format!("[{}]", items.join(", "))
}
