use crate::config::ValidationConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `(relative path, content)` pairs under `root`, creating parents.
pub(crate) fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
}

/// Create a temp dir populated with `files`.
pub(crate) fn create_tree(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_tree(temp_dir.path(), files);
    temp_dir
}

/// Write an executable `sh` script at `root/rel`.
#[cfg(unix)]
pub(crate) fn write_script(root: &Path, rel: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Script body that prints the sum of the two numbers on the first line of `$1`.
#[cfg(unix)]
pub(crate) const SUM_PROGRAM: &str = r#"read a b < "$1"
echo $((a + b))"#;

/// A config whose required keys point at the given golden files.
pub(crate) fn sample_config(functional_input: &Path, functional_output: &Path) -> ValidationConfig {
    ValidationConfig {
        executable: "bin/app".to_string(),
        functional_input: functional_input.to_string_lossy().into_owned(),
        functional_output: functional_output.to_string_lossy().into_owned(),
        ..Default::default()
    }
}
