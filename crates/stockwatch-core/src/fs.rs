//! Filesystem helpers shared by the pipeline stages.
//!
//! File presence is the hand-off between stages, so every write or move that
//! another stage may observe goes through a temporary name in the destination
//! directory and is renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use tempfile::NamedTempFile;

use crate::error::{Result, StockwatchError};

/// Create a directory (and parents) or fail with a startup diagnostic
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| StockwatchError::DirectoryUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Move `src` to `dst`.
///
/// Uses a rename when both live on the same volume. Otherwise the bytes are
/// copied into a temporary file next to `dst`, renamed into place, and only
/// then is `src` removed.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound || !src.exists() => Err(err),
        Err(err) => {
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                error = %err,
                "Rename failed, falling back to copy"
            );
            copy_into_place(src, dst)?;
            fs::remove_file(src)
        }
    }
}

fn copy_into_place(src: &Path, dst: &Path) -> io::Result<()> {
    let parent = dst.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent)?;
    let mut reader = fs::File::open(src)?;
    io::copy(&mut reader, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(dst).map_err(|e| e.error)?;
    Ok(())
}

/// Write `data` to `path` via a temporary sibling and an atomic rename
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Names of the regular files in `dir`, sorted. Hidden entries (in-flight
/// temporary files) are skipped.
pub fn list_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Last modification time of a file, `None` if it cannot be read
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether `name` has one of the given extensions (case-insensitive)
pub fn has_extension(name: &str, extensions: &[&str]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_file_same_volume() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.jpg");
        let dst = dir.path().join("sub");
        fs::create_dir(&dst).unwrap();
        fs::write(&src, b"frame").unwrap();

        move_file(&src, &dst.join("b.jpg")).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(dst.join("b.jpg")).unwrap(), b"frame");
    }

    #[test]
    fn test_move_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let result = move_file(&dir.path().join("missing.jpg"), &dir.path().join("x.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("areas.json");
        write_atomic(&path, b"[]").unwrap();
        write_atomic(&path, b"[1]").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"[1]");
        assert_eq!(list_files(dir.path()).unwrap(), vec!["areas.json".to_string()]);
    }

    #[test]
    fn test_list_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.jpg"), b"").unwrap();
        fs::write(dir.path().join("a.jpg"), b"").unwrap();
        fs::write(dir.path().join(".tmpXYZ"), b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(list_files(dir.path()).unwrap(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("x.JPG", &["jpg", "jpeg"]));
        assert!(has_extension("x.jpeg", &["jpg", "jpeg"]));
        assert!(!has_extension("x.png", &["jpg"]));
        assert!(!has_extension("jpg", &["jpg"]));
    }
}
