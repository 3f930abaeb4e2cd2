//! File access behind a trait so directory scanning stays testable.

use std::path::{Path, PathBuf};

/// Filesystem operations the plugin-directory scan needs. Injected into the
/// finder; production code uses [`FsFileProvider`], tests substitute an
/// in-memory map.
pub trait FileProvider: Send + Sync {
    fn dir_exists(&self, path: &Path) -> bool;

    /// Files directly under `path` whose name ends with `suffix`, sorted by
    /// name for deterministic scans.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the directory cannot be read.
    fn list_files(&self, path: &Path, suffix: &str) -> std::io::Result<Vec<PathBuf>>;

    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// [`FileProvider`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileProvider;

impl FileProvider for FsFileProvider {
    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, path: &Path, suffix: &str) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            let is_match = path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(suffix));
            if is_match {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}
