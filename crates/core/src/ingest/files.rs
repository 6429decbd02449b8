//! Source discovery, staged files and cleanup

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of sanitized copies written next to the sources
pub const STAGED_PREFIX: &str = "preprocessed_";

/// Find every `*.csv` directly inside `dir`, sorted by path
pub fn discover_csvs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.csv", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries =
        glob::glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Error accessing path: {}", e),
        }
    }

    files.sort();
    Ok(files)
}

/// Copy every CSV from `source` into `target`, returning the copies
///
/// A file that already is its own destination is left alone and not
/// returned, so cleaning up the copies never touches a source. On failure
/// the copies made so far are removed again.
pub fn copy_csvs(source: &Path, target: &Path) -> io::Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for file in discover_csvs(source)? {
        let Some(name) = file.file_name() else {
            continue;
        };
        let destination = target.join(name);
        if is_same_file(&file, &destination)? {
            tracing::debug!(file = %file.display(), "source already in target directory");
            continue;
        }
        if let Err(e) = fs::copy(&file, &destination) {
            copied.push(destination);
            cleanup_files(&copied);
            return Err(e);
        }
        tracing::debug!(from = %file.display(), to = %destination.display(), "copied source");
        copied.push(destination);
    }

    tracing::info!(
        files = copied.len(),
        source = %source.display(),
        target = %target.display(),
        "copied source files"
    );
    Ok(copied)
}

/// Whether `a` and `b` name the same existing file
fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    if !b.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

/// Delete files, returning a warning per file that could not be removed
pub fn cleanup_files(files: &[PathBuf]) -> Vec<String> {
    let mut warnings = Vec::new();
    for file in files {
        if let Err(e) = fs::remove_file(file) {
            tracing::warn!(file = %file.display(), error = %e, "could not delete file");
            warnings.push(format!("Could not delete {}: {}", file.display(), e));
        }
    }
    warnings
}

/// Path of the sanitized copy of `source` inside `dir`
pub fn staged_path(dir: &Path, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{STAGED_PREFIX}{name}"))
}

/// Owner of a sanitized temporary file
///
/// Call [`StagedFile::remove`] to delete it and observe failures. If the
/// guard is dropped first the file is still removed and a failure is logged.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    /// Take ownership of `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            removed: false,
        }
    }

    /// Path of the staged file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file; a file that was never written counts as removed
    pub fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(file = %self.path.display(), error = %e, "could not delete staged file");
            }
        }
    }
}
