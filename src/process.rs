//! External command runner for keju.
//!
//! Configured commands are opaque strings executed through the platform
//! shell (`sh -c` / `cmd /C`), so graders can use pipelines, redirection and
//! `&&` chains. Configuration is trusted input from the grader; nothing from
//! the submission is ever interpolated into a command line unquoted.
//!
//! Exit status 0 is the only success signal. There are no retries: a single
//! failed invocation fails the calling stage.

use crate::error::{KejuError, Result};
use std::fs::File;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Where a child's stdout or stderr goes.
#[derive(Debug)]
pub enum OutputSink {
    /// Share this process's stream.
    Inherit,
    /// Collect into [`CommandOutcome`].
    Capture,
    /// Write into an already open file.
    File(File),
    /// Discard.
    Null,
}

impl OutputSink {
    fn into_stdio(self) -> Stdio {
        match self {
            OutputSink::Inherit => Stdio::inherit(),
            OutputSink::Capture => Stdio::piped(),
            OutputSink::File(file) => Stdio::from(file),
            OutputSink::Null => Stdio::null(),
        }
    }
}

/// Result of one external command invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutcome {
    /// The command line that was executed.
    pub command: String,
    /// True iff the process exited with status 0.
    pub succeeded: bool,
    /// Exit code (None if killed by a signal, timed out, or never launched).
    pub exit_code: Option<i32>,
    /// Captured stdout, when the stdout sink was [`OutputSink::Capture`].
    pub stdout: Option<String>,
    /// Captured stderr, when the stderr sink was [`OutputSink::Capture`].
    pub stderr: Option<String>,
    /// Whether the process was killed after exceeding the timeout.
    pub timed_out: bool,
    /// Set when the process could not be started or waited on.
    pub launch_error: Option<String>,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.succeeded
    }

    /// One-line explanation of why the command did not succeed.
    pub fn failure_reason(&self) -> String {
        if let Some(err) = &self.launch_error {
            format!("failed to execute '{}': {}", self.command, err)
        } else if self.timed_out {
            format!("'{}' timed out and was killed", self.command)
        } else {
            match self.exit_code {
                Some(code) => format!("'{}' failed with exit code {}", self.command, code),
                None => format!("'{}' was terminated by a signal", self.command),
            }
        }
    }

    fn launch_failed(command: &str, err: impl std::fmt::Display) -> Self {
        Self {
            command: command.to_string(),
            launch_error: Some(err.to_string()),
            ..Default::default()
        }
    }
}

/// Runs shell command lines synchronously.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout` (None waits forever).
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run a command line with stdout/stderr directed to the given sinks.
    ///
    /// Launch failures are reported through the outcome rather than as an
    /// error; they count as an unsuccessful run.
    pub fn run(&self, command_line: &str, stdout: OutputSink, stderr: OutputSink) -> CommandOutcome {
        let mut command = shell_command(command_line);
        command
            .stdin(Stdio::null())
            .stdout(stdout.into_stdio())
            .stderr(stderr.into_stdio());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // On timeout the whole group is killed, so children of the shell
            // cannot outlive it and keep captured pipes open.
            if self.timeout.is_some() {
                command.process_group(0);
            }
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(command = command_line, error = %e, "failed to launch command");
                return CommandOutcome::launch_failed(command_line, e);
            }
        };

        // Drain pipes on their own threads so a chatty child cannot block on a full pipe.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let waited = wait_with_timeout(&mut child, self.timeout);

        let stdout = stdout_reader.map(join_reader);
        let stderr = stderr_reader.map(join_reader);

        let (exit_code, timed_out) = match waited {
            Ok(status) => status,
            Err(e) => {
                error!(command = command_line, error = %e, "failed to wait for command");
                return CommandOutcome {
                    stdout,
                    stderr,
                    ..CommandOutcome::launch_failed(command_line, e)
                };
            }
        };

        let outcome = CommandOutcome {
            command: command_line.to_string(),
            succeeded: !timed_out && exit_code == Some(0),
            exit_code,
            stdout,
            stderr,
            timed_out,
            launch_error: None,
        };

        if outcome.succeeded {
            info!(command = command_line, "command returned 0");
        } else {
            error!(
                command = command_line,
                exit_code = ?outcome.exit_code,
                timed_out = outcome.timed_out,
                "command failed"
            );
        }

        outcome
    }

    /// Run a command sharing this process's stdout and stderr.
    pub fn run_inherited(&self, command_line: &str) -> CommandOutcome {
        self.run(command_line, OutputSink::Inherit, OutputSink::Inherit)
    }

    /// Like [`ProcessRunner::run`], but a failed run becomes `KejuError::ProcessFailure`.
    pub fn run_checked(
        &self,
        command_line: &str,
        stdout: OutputSink,
        stderr: OutputSink,
    ) -> Result<CommandOutcome> {
        let outcome = self.run(command_line, stdout, stderr);
        if outcome.is_success() {
            Ok(outcome)
        } else {
            Err(KejuError::ProcessFailure(outcome.failure_reason()))
        }
    }
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(command_line);
    command
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

/// Wait for a child process, killing it once `timeout` elapses.
///
/// Returns (exit_code, timed_out).
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<(Option<i32>, bool)> {
    let Some(timeout) = timeout else {
        return child.wait().map(|status| (status.code(), false));
    };

    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status.code(), false));
        }
        if start.elapsed() >= timeout {
            kill_process_group(child);
            // On Unix this is SIGKILL; on Windows it is TerminateProcess.
            let _ = child.kill();
            let _ = child.wait();
            return Ok((None, true));
        }
        std::thread::sleep(poll_interval);
    }
}

/// SIGKILL the process group led by `child` (see `process_group(0)` in `run`).
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    #[allow(clippy::cast_possible_wrap)]
    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        tracing::warn!(pgid = child.id(), error = %e, "failed to kill process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn zero_exit_is_success_and_output_is_captured() {
        let outcome =
            ProcessRunner::new().run("echo hello", OutputSink::Capture, OutputSink::Capture);

        assert!(outcome.is_success());
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.stdout.as_deref(), Some("hello\n"));
        assert_eq!(outcome.stderr.as_deref(), Some(""));
    }

    #[test]
    fn non_zero_exit_is_failure() {
        let outcome = ProcessRunner::new().run("exit 3", OutputSink::Null, OutputSink::Null);

        assert!(!outcome.is_success());
        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.failure_reason().contains("exit code 3"));
    }

    #[test]
    fn stderr_is_captured_separately() {
        let outcome = ProcessRunner::new().run(
            "echo out; echo oops 1>&2",
            OutputSink::Capture,
            OutputSink::Capture,
        );

        assert_eq!(outcome.stdout.as_deref(), Some("out\n"));
        assert_eq!(outcome.stderr.as_deref(), Some("oops\n"));
    }

    #[test]
    fn shell_pipelines_and_chains_work() {
        let outcome = ProcessRunner::new().run(
            "printf 'a\\nb\\nc\\n' | wc -l | tr -d ' ' && echo done",
            OutputSink::Capture,
            OutputSink::Null,
        );

        assert!(outcome.is_success());
        assert_eq!(outcome.stdout.as_deref(), Some("3\ndone\n"));
    }

    #[test]
    fn unknown_program_fails() {
        let outcome = ProcessRunner::new().run(
            "definitely-not-a-real-program-keju",
            OutputSink::Null,
            OutputSink::Null,
        );

        assert!(!outcome.is_success());
        assert_eq!(outcome.exit_code, Some(127));
    }

    #[test]
    fn file_sink_receives_stdout() {
        let mut target = NamedTempFile::new().unwrap();
        let file = target.reopen().unwrap();

        let outcome =
            ProcessRunner::new().run("echo to-file", OutputSink::File(file), OutputSink::Null);
        assert!(outcome.is_success());
        assert!(outcome.stdout.is_none());

        let mut written = String::new();
        target.as_file_mut().read_to_string(&mut written).unwrap();
        assert_eq!(written, "to-file\n");
    }

    #[test]
    fn timeout_kills_long_running_command() {
        let runner = ProcessRunner::with_timeout(Some(Duration::from_millis(200)));
        let start = Instant::now();

        let outcome = runner.run("sleep 5", OutputSink::Null, OutputSink::Null);

        assert!(outcome.timed_out);
        assert!(!outcome.is_success());
        assert!(outcome.failure_reason().contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn timeout_is_enforced_while_capturing_output() {
        let runner = ProcessRunner::with_timeout(Some(Duration::from_millis(200)));
        let start = Instant::now();

        // `sleep` is a child of the shell and holds the stdout pipe open.
        let outcome = runner.run("sleep 4; echo done", OutputSink::Capture, OutputSink::Null);

        assert!(outcome.timed_out);
        assert!(
            start.elapsed() < Duration::from_secs(3),
            "took {:?}",
            start.elapsed()
        );
        assert_eq!(outcome.stdout.as_deref(), Some(""));
    }

    #[test]
    fn timeout_kills_children_of_the_shell() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("late");
        let runner = ProcessRunner::with_timeout(Some(Duration::from_millis(200)));

        let outcome = runner.run_inherited(&format!(
            "sleep 1 && touch {}",
            shell_words::quote(&marker.to_string_lossy())
        ));
        assert!(outcome.timed_out);

        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn run_checked_maps_failure_to_process_error() {
        let err = ProcessRunner::new()
            .run_checked("exit 1", OutputSink::Null, OutputSink::Null)
            .unwrap_err();

        assert!(matches!(err, KejuError::ProcessFailure(_)));
        assert!(err.to_string().contains("exit 1"));
    }
}
