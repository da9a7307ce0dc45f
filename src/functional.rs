//! Functional validation against golden input/output files.
//!
//! Line `i` of the golden input is one case; line `i` of the golden output is
//! its expected result. For each case the input line is written verbatim to a
//! transient file, the program is run with that file's path as its only
//! argument, and the first line of its stdout is compared with the expected
//! line. Line terminators (`\n` or `\r\n`) are stripped on both sides before
//! comparing.

use crate::error::{KejuError, Result};
use crate::process::{OutputSink, ProcessRunner};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Outcome of one functional case. Not retained after it is tallied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalCaseResult {
    pub input_line: String,
    pub expected_line: String,
    pub actual_line: String,
    pub passed: bool,
}

/// Pass/fail counts over all cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionalTally {
    pub passed: usize,
    pub failed: usize,
}

impl FunctionalTally {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Verdict: pass iff no case failed.
    pub fn is_pass(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, case: &FunctionalCaseResult) {
        if case.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Runs a program once per golden input line.
pub struct FunctionalComparator<'a> {
    runner: &'a ProcessRunner,
}

impl<'a> FunctionalComparator<'a> {
    pub fn new(runner: &'a ProcessRunner) -> Self {
        Self { runner }
    }

    /// Compare `executable`'s output for every line of `golden_input`.
    ///
    /// Output mismatches are counted in the tally. A run that fails to
    /// launch or exits non-zero aborts the comparison with
    /// `KejuError::ProcessFailure`, whose message carries the counts of the
    /// cases completed before it.
    pub fn compare(
        &self,
        executable: &Path,
        golden_input: &Path,
        golden_output: &Path,
    ) -> Result<FunctionalTally> {
        let mut inputs = open_lines(golden_input)?;
        let mut outputs = open_lines(golden_output)?;
        let mut tally = FunctionalTally::default();

        while let Some(input_line) = next_line(&mut inputs, golden_input)? {
            // An exhausted golden output compares against the empty string.
            let expected = next_line(&mut outputs, golden_output)?.unwrap_or_default();

            let case = self
                .run_case(executable, &input_line, strip_terminator(&expected))
                .map_err(|err| match err {
                    KejuError::ProcessFailure(msg) => KejuError::ProcessFailure(format!(
                        "{} (test result so far: {}/{} passed)",
                        msg,
                        tally.passed,
                        tally.total()
                    )),
                    other => other,
                })?;
            if case.passed {
                info!(input = %case.input_line, "result is correct");
            } else {
                warn!(
                    input = %case.input_line,
                    expected = %case.expected_line,
                    actual = %case.actual_line,
                    "result is not correct"
                );
            }
            tally.record(&case);
        }

        Ok(tally)
    }

    fn run_case(
        &self,
        executable: &Path,
        input_line: &str,
        expected: &str,
    ) -> Result<FunctionalCaseResult> {
        // Both transient files are removed when they go out of scope, on every path.
        let mut input_file = NamedTempFile::new()
            .map_err(|e| KejuError::IoError(format!("failed to create transient input file: {}", e)))?;
        input_file
            .write_all(input_line.as_bytes())
            .and_then(|_| input_file.flush())
            .map_err(|e| KejuError::io("write transient input", input_file.path(), e))?;

        let output_file = NamedTempFile::new().map_err(|e| {
            KejuError::IoError(format!("failed to create transient output file: {}", e))
        })?;
        let sink = output_file
            .reopen()
            .map_err(|e| KejuError::io("open transient output", output_file.path(), e))?;

        let command_line = format!(
            "{} {}",
            shell_words::quote(&executable.to_string_lossy()),
            shell_words::quote(&input_file.path().to_string_lossy())
        );

        let outcome = self
            .runner
            .run(&command_line, OutputSink::File(sink), OutputSink::Inherit);
        if !outcome.is_success() {
            return Err(KejuError::ProcessFailure(format!(
                "failed to run {}: {}",
                executable.display(),
                outcome.failure_reason()
            )));
        }

        let reader = output_file
            .reopen()
            .map_err(|e| KejuError::io("read transient output", output_file.path(), e))?;
        let mut first = Vec::new();
        BufReader::new(reader)
            .read_until(b'\n', &mut first)
            .map_err(|e| KejuError::io("read transient output", output_file.path(), e))?;
        let actual = String::from_utf8_lossy(&first);
        let actual = strip_terminator(&actual);

        Ok(FunctionalCaseResult {
            input_line: strip_terminator(input_line).to_string(),
            expected_line: expected.to_string(),
            actual_line: actual.to_string(),
            passed: actual == expected,
        })
    }
}

fn open_lines(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| KejuError::io("open golden file", path, e))
}

/// Next line including its terminator, or None at end of file.
fn next_line(reader: &mut BufReader<File>, path: &Path) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let n = reader
        .read_until(b'\n', &mut buf)
        .map_err(|e| KejuError::io("read golden file", path, e))?;
    if n == 0 {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

fn strip_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{SUM_PROGRAM, create_tree, write_script};
    use tempfile::TempDir;

    fn golden(input: &str, output: &str) -> TempDir {
        create_tree(&[("input.txt", input), ("output.txt", output)])
    }

    fn run(executable: &Path, dir: &TempDir) -> Result<FunctionalTally> {
        let runner = ProcessRunner::new();
        FunctionalComparator::new(&runner).compare(
            executable,
            &dir.path().join("input.txt"),
            &dir.path().join("output.txt"),
        )
    }

    #[test]
    fn test_all_cases_pass() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "sum", SUM_PROGRAM);
        let dir = golden("2 3\n5 5\n", "5\n10\n");

        let tally = run(&exe, &dir).unwrap();

        assert_eq!(tally, FunctionalTally { passed: 2, failed: 0 });
        assert!(tally.is_pass());
    }

    #[test]
    fn test_one_wrong_expectation_counts_one_failure() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "sum", SUM_PROGRAM);
        let dir = golden("2 3\n5 5\n", "6\n10\n");

        let tally = run(&exe, &dir).unwrap();

        assert_eq!(tally, FunctionalTally { passed: 1, failed: 1 });
        assert!(!tally.is_pass());
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn test_missing_final_newline_in_golden_output_still_matches() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "sum", SUM_PROGRAM);
        let dir = golden("2 3\n5 5", "5\r\n10");

        let tally = run(&exe, &dir).unwrap();

        assert_eq!(tally.passed, 2);
    }

    #[test]
    fn test_exhausted_golden_output_compares_against_empty() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "sum", SUM_PROGRAM);
        let dir = golden("2 3\n5 5\n", "5\n");

        let tally = run(&exe, &dir).unwrap();

        assert_eq!(tally, FunctionalTally { passed: 1, failed: 1 });
    }

    #[test]
    fn test_only_first_output_line_is_compared() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "chatty", "echo 42\necho trailing noise");
        let dir = golden("anything\n", "42\n");

        let tally = run(&exe, &dir).unwrap();

        assert_eq!(tally.passed, 1);
    }

    #[test]
    fn test_program_failure_aborts_comparison() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "crash", "echo partial\nexit 4");
        let dir = golden("1 1\n2 2\n", "2\n4\n");

        let err = run(&exe, &dir).unwrap_err();

        assert!(matches!(err, KejuError::ProcessFailure(_)));
        assert!(err.to_string().contains("exit code 4"));
    }

    #[test]
    fn test_crash_mid_run_reports_counts_so_far() {
        let bin = TempDir::new().unwrap();
        let body = "read a b < \"$1\"\n[ \"$a\" = 9 ] && exit 3\necho $((a + b))";
        let exe = write_script(bin.path(), "flaky", body);
        let dir = golden("1 1\n2 2\n9 9\n", "2\n5\n18\n");

        let err = run(&exe, &dir).unwrap_err();

        assert!(matches!(err, KejuError::ProcessFailure(_)));
        assert!(err.to_string().contains("test result so far: 1/2 passed"), "{err}");
    }

    #[test]
    fn test_input_line_is_written_verbatim_and_transient_files_removed() {
        let bin = TempDir::new().unwrap();
        let log = bin.path().join("seen.log");
        let body = format!(
            "echo \"$1\" >> '{log}'\ncat \"$1\" >> '{log}'\necho ok",
            log = log.display()
        );
        let exe = write_script(bin.path(), "spy", &body);
        let dir = golden("first case\nsecond\n", "ok\nok\n");

        let tally = run(&exe, &dir).unwrap();
        assert_eq!(tally.passed, 2);

        let seen = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = seen.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "first case");
        assert_eq!(lines[3], "second");
        assert!(!Path::new(lines[0]).exists());
        assert!(!Path::new(lines[2]).exists());
    }

    #[test]
    fn test_executable_path_with_spaces() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "my build/sum app", SUM_PROGRAM);
        let dir = golden("40 2\n", "42\n");

        let tally = run(&exe, &dir).unwrap();

        assert_eq!(tally.passed, 1);
    }

    #[test]
    fn test_missing_golden_input_is_io_error() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "sum", SUM_PROGRAM);
        let dir = TempDir::new().unwrap();

        let err = run(&exe, &dir).unwrap_err();

        assert!(matches!(err, KejuError::IoError(_)));
    }

    #[test]
    fn test_empty_golden_input_has_no_cases() {
        let bin = TempDir::new().unwrap();
        let exe = write_script(bin.path(), "sum", SUM_PROGRAM);
        let dir = golden("", "");

        let tally = run(&exe, &dir).unwrap();

        assert_eq!(tally.total(), 0);
        assert!(tally.is_pass());
    }

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator("5\n"), "5");
        assert_eq!(strip_terminator("5\r\n"), "5");
        assert_eq!(strip_terminator("5"), "5");
        assert_eq!(strip_terminator(""), "");
    }
}
