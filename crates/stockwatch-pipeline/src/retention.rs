//! Archive retention

use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use stockwatch_core::fs::list_files;

/// Delete archive files whose modification time is at least `retention`
/// before `now`. Returns the deleted names.
///
/// Listing failures are returned; a file that cannot be inspected or removed
/// is logged and skipped.
pub fn cleanup_archive(dir: &Path, retention: Duration, now: SystemTime) -> io::Result<Vec<String>> {
    let mut deleted = Vec::new();

    for name in list_files(dir)? {
        let path = dir.join(&name);

        let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Cannot read archive file age");
                continue;
            }
        };

        // Files stamped in the future count as fresh
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < retention {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(file = %name, age_secs = age.as_secs(), "Deleted expired archive file");
                deleted.push(name);
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Failed to delete archive file");
            }
        }
    }

    Ok(deleted)
}
