//! Lock-step comparison of two directory trees.
//!
//! Paths in a [`DiffResult`] are relative to the tree roots, use `/` as the
//! separator and start with `.` (for example `./src/main.cpp`). An entry that
//! exists only on one side is reported once; its children are not listed.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::warn;

/// Entry names skipped on both sides at every level.
pub const DEFAULT_IGNORED_NAMES: &[&str] = &[
    "RCS",
    "CVS",
    "tags",
    ".git",
    ".hg",
    ".bzr",
    "_darcs",
    "__pycache__",
];

const COMPARE_CHUNK: usize = 8 * 1024;

/// Differences between a left (submission) and right (seed) tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Present on both sides with different content (or different kinds).
    pub differing_files: BTreeSet<String>,
    /// Present only in the left tree: files the submitter added.
    pub left_only_files: BTreeSet<String>,
    /// Present only in the right tree: seed files missing from the submission.
    pub right_only_files: BTreeSet<String>,
    /// Entries that could not be read during the walk.
    pub diagnostics: Vec<String>,
}

impl DiffResult {
    /// True when the trees have no differences of any kind.
    pub fn is_identical(&self) -> bool {
        self.differing_files.is_empty()
            && self.left_only_files.is_empty()
            && self.right_only_files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Recursive directory comparer.
#[derive(Debug, Clone)]
pub struct TreeDiffer {
    ignored_names: BTreeSet<String>,
}

impl Default for TreeDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeDiffer {
    /// A differ that skips [`DEFAULT_IGNORED_NAMES`].
    pub fn new() -> Self {
        Self::with_ignored_names(DEFAULT_IGNORED_NAMES.iter().copied())
    }

    /// A differ that skips exactly the given entry names.
    pub fn with_ignored_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Compare `left` against `right`.
    ///
    /// Never fails: unreadable directories and files are recorded in
    /// `diagnostics` and classified as absent on the side that could not be
    /// read.
    pub fn diff<L: AsRef<Path>, R: AsRef<Path>>(&self, left: L, right: R) -> DiffResult {
        let mut result = DiffResult::default();
        self.walk(left.as_ref(), right.as_ref(), ".", &mut result);
        result
    }

    fn walk(&self, left_dir: &Path, right_dir: &Path, level: &str, result: &mut DiffResult) {
        let left = self.list_dir(left_dir, result);
        let right = self.list_dir(right_dir, result);

        let names: BTreeSet<&String> = left.keys().chain(right.keys()).collect();

        for name in names {
            let rel = format!("{}/{}", level, name);
            match (left.get(name), right.get(name)) {
                (Some(EntryKind::Dir), Some(EntryKind::Dir)) => {
                    self.walk(&left_dir.join(name), &right_dir.join(name), &rel, result);
                }
                (Some(EntryKind::File), Some(EntryKind::File)) => {
                    match files_equal(&left_dir.join(name), &right_dir.join(name)) {
                        Ok(true) => {}
                        Ok(false) => {
                            result.differing_files.insert(rel);
                        }
                        Err((side, e)) => {
                            let note = format!("cannot read {:?} side of {}: {}", side, rel, e);
                            warn!("{}", note);
                            result.diagnostics.push(note);
                            match side {
                                Side::Left => result.right_only_files.insert(rel),
                                Side::Right => result.left_only_files.insert(rel),
                            };
                        }
                    }
                }
                (Some(_), Some(_)) => {
                    // A file on one side and a directory on the other.
                    result.differing_files.insert(rel);
                }
                (Some(_), None) => {
                    result.left_only_files.insert(rel);
                }
                (None, Some(_)) => {
                    result.right_only_files.insert(rel);
                }
                (None, None) => {}
            }
        }
    }

    /// List entry names and kinds, following symlinks.
    fn list_dir(&self, dir: &Path, result: &mut DiffResult) -> BTreeMap<String, EntryKind> {
        let mut entries = BTreeMap::new();

        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                let note = format!("cannot list directory '{}': {}", dir.display(), e);
                warn!("{}", note);
                result.diagnostics.push(note);
                return entries;
            }
        };

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let note = format!("cannot read entry in '{}': {}", dir.display(), e);
                    warn!("{}", note);
                    result.diagnostics.push(note);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if self.ignored_names.contains(&name) {
                continue;
            }

            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => {
                    entries.insert(name, EntryKind::Dir);
                }
                Ok(_) => {
                    entries.insert(name, EntryKind::File);
                }
                Err(e) => {
                    let note = format!("cannot stat '{}': {}", entry.path().display(), e);
                    warn!("{}", note);
                    result.diagnostics.push(note);
                }
            }
        }

        entries
    }
}

/// Byte-for-byte comparison. The error names the side that failed.
fn files_equal(left: &Path, right: &Path) -> Result<bool, (Side, io::Error)> {
    let mut left_file = File::open(left).map_err(|e| (Side::Left, e))?;
    let mut right_file = File::open(right).map_err(|e| (Side::Right, e))?;

    let left_len = left_file.metadata().map_err(|e| (Side::Left, e))?.len();
    let right_len = right_file.metadata().map_err(|e| (Side::Right, e))?.len();
    if left_len != right_len {
        return Ok(false);
    }

    let mut left_buf = [0u8; COMPARE_CHUNK];
    let mut right_buf = [0u8; COMPARE_CHUNK];
    loop {
        let n = read_full(&mut left_file, &mut left_buf).map_err(|e| (Side::Left, e))?;
        let m = read_full(&mut right_file, &mut right_buf).map_err(|e| (Side::Right, e))?;
        if n != m || left_buf[..n] != right_buf[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows; returns bytes read (0 at EOF).
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
