//! Human-readable summary of a pipeline run.

use super::{PipelineReport, StageStatus};
use chrono::Utc;

/// Maximum number of lines of a stage message shown in the summary.
const SUMMARY_MAX_LINES: usize = 20;

/// Format the run summary printed after the last stage.
pub fn format_summary(report: &PipelineReport) -> String {
    let now = Utc::now();
    let mut summary = format!(
        "Validation run: {}\nResult: {}\n\n",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        if report.passed() { "PASS" } else { "FAIL" }
    );

    for result in &report.results {
        let status = match result.status {
            StageStatus::Pass => "PASS",
            StageStatus::Fail => "FAIL",
            StageStatus::Skip => "SKIP",
        };
        summary.push_str(&format!("  {}: {}\n", result.stage, status));

        if let Some(msg) = &result.message {
            for line in truncate_lines(msg, SUMMARY_MAX_LINES) {
                summary.push_str(&format!("    {}\n", line));
            }
        }
    }

    if let Some(stage) = report.failed_stage() {
        summary.push_str(&format!("\nStopped at stage: {}\n", stage));
    }

    summary
}

/// Keep the last `max_lines` lines (most likely to contain the error).
fn truncate_lines(text: &str, max_lines: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() > max_lines {
        let mut kept = vec!["...(truncated)..."];
        kept.extend_from_slice(&lines[lines.len() - max_lines..]);
        kept
    } else {
        lines
    }
}
