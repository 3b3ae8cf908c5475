use std::fs;
use std::path::{Path, PathBuf};

use crate::error::OzoneError;

/// Outcome of preparing a staging directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prepared {
    Created,
    Cleaned { removed: usize },
}

/// Creates `dir` recursively, or removes the regular files already in it.
/// Subdirectories are left alone.
pub fn prepare_dir(dir: &Path) -> Result<Prepared, OzoneError> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .map_err(|err| OzoneError::Filesystem(format!("create {}: {err}", dir.display())))?;
        return Ok(Prepared::Created);
    }
    let removed = remove_files_matching(dir, |_| true)?;
    Ok(Prepared::Cleaned { removed })
}

/// Removes every entry inside `dir`, keeping `dir` itself.
pub fn clear_dir(dir: &Path) -> Result<usize, OzoneError> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for path in list_entries(dir)? {
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|err| OzoneError::Filesystem(format!("remove {}: {err}", path.display())))?;
        removed += 1;
    }
    Ok(removed)
}

/// Removes the regular files in `dir` whose name satisfies `matches`.
pub fn remove_files_matching<F>(dir: &Path, matches: F) -> Result<usize, OzoneError>
where
    F: Fn(&str) -> bool,
{
    let mut removed = 0;
    for path in list_entries(dir)? {
        if path.is_dir() {
            continue;
        }
        let name_matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(&matches)
            .unwrap_or(false);
        if !name_matches {
            continue;
        }
        fs::remove_file(&path)
            .map_err(|err| OzoneError::Filesystem(format!("remove {}: {err}", path.display())))?;
        removed += 1;
    }
    Ok(removed)
}

/// Direct children of `dir`, sorted by path.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, OzoneError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| OzoneError::Filesystem(format!("read {}: {err}", dir.display())))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| OzoneError::Filesystem(err.to_string()))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}
