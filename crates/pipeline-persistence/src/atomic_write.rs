//! Atomic file writes: temp file in the same directory, fsync, then rename.
//!
//! No Windows rename-retry or cross-filesystem fallback: the output
//! directory is assumed to live on a single, operator-guaranteed
//! filesystem, so a plain rename after fsync is sufficient.

use std::fs;
use std::io::Write;

use camino::Utf8Path;
use tempfile::NamedTempFile;

use crate::error::PersistenceError;

/// Atomically write `content` to `path`: write to a temp file in the same
/// directory, fsync it, then rename over the destination.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<(), PersistenceError> {
    let dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(dir).map_err(|e| PersistenceError::Write(e.to_string()))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| PersistenceError::Write(e.to_string()))?;
    temp.write_all(content.as_bytes()).map_err(|e| PersistenceError::Write(e.to_string()))?;
    temp.as_file().sync_all().map_err(|e| PersistenceError::Write(e.to_string()))?;
    temp.persist(path.as_std_path()).map_err(|e| PersistenceError::Write(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_content_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.json");
        let target = Utf8Path::from_path(&target).unwrap();
        write_file_atomic(target, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "{}");
    }

    #[test]
    fn no_partial_file_visible_under_the_final_name_before_persist() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.json");
        let target = Utf8Path::from_path(&target).unwrap();
        write_file_atomic(target, "hello").unwrap();
        // Only the final file remains in the directory; the temp file is gone.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
