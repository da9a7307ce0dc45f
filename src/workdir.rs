//! Scoped control of the process working directory.
//!
//! The current directory is process-wide state. Creating a
//! [`WorkingDirectoryStack`] takes a process-wide lock that is held until the
//! stack is dropped, so only one stack (and therefore one validation run)
//! can move the process between directories at a time.

use crate::error::{KejuError, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};
use tracing::{debug, error};

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// A pushd/popd style stack of previous working directories.
pub struct WorkingDirectoryStack {
    previous: Vec<PathBuf>,
    _lock: MutexGuard<'static, ()>,
}

impl WorkingDirectoryStack {
    /// Acquire the process working directory.
    ///
    /// Blocks while another stack is alive.
    pub fn new() -> Self {
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        Self {
            previous: Vec::new(),
            _lock: lock,
        }
    }

    /// Change into `path`, remembering the current directory.
    ///
    /// On failure the working directory and the stack are unchanged.
    pub fn push<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let current = env::current_dir().map_err(|e| {
            KejuError::IoError(format!("failed to get current working directory: {}", e))
        })?;

        env::set_current_dir(path)
            .map_err(|e| KejuError::io("change working directory to", path, e))?;

        debug!(from = %current.display(), to = %path.display(), "pushed working directory");
        self.previous.push(current);
        Ok(())
    }

    /// Return to the directory active before the most recent `push`.
    pub fn pop(&mut self) -> Result<()> {
        let previous = self.previous.pop().ok_or_else(|| {
            KejuError::IoError("cannot pop working directory: stack is empty".to_string())
        })?;

        env::set_current_dir(&previous)
            .map_err(|e| KejuError::io("restore working directory to", &previous, e))?;

        debug!(to = %previous.display(), "popped working directory");
        Ok(())
    }

    /// Number of directories waiting to be restored.
    pub fn depth(&self) -> usize {
        self.previous.len()
    }

    /// Push `path` and return a guard that pops when dropped.
    ///
    /// The pop runs on every exit path of the caller, including early
    /// returns through `?` and unwinding.
    pub fn enter<P: AsRef<Path>>(&mut self, path: P) -> Result<DirScope<'_>> {
        self.push(path)?;
        Ok(DirScope { stack: self })
    }
}

impl Default for WorkingDirectoryStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkingDirectoryStack {
    fn drop(&mut self) {
        // Unbalanced pushes still leave the process where it started.
        if let Some(original) = self.previous.first()
            && let Err(e) = env::set_current_dir(original)
        {
            error!(dir = %original.display(), error = %e, "failed to restore working directory");
        }
    }
}

/// Guard returned by [`WorkingDirectoryStack::enter`].
pub struct DirScope<'a> {
    stack: &'a mut WorkingDirectoryStack,
}

impl DirScope<'_> {
    /// Depth of the underlying stack, including this scope.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }
}

impl Drop for DirScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.stack.pop() {
            error!(error = %e, "working directory was not restored");
        }
    }
}
