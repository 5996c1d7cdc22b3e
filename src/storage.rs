// src/storage.rs
// =============================================================================
// Checks the download directory before any network activity.
//
// - Missing directory: create it (including parents)
// - Existing path:     must be a directory we can write into
//
// Writability is tested by actually creating a file there; permission bits
// alone don't account for ACLs, read-only mounts, or running as root.
// =============================================================================

use crate::error::PathError;
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn verify_path(path: &Path) -> Result<(), PathError> {
    if !path.exists() {
        debug!(path = %path.display(), "creating download directory");
        return fs::create_dir_all(path).map_err(|source| PathError::Create {
            path: path.to_path_buf(),
            source,
        });
    }

    if !path.is_dir() {
        return Err(PathError::NotDirectory {
            path: path.to_path_buf(),
        });
    }

    // Removed again as soon as the handle drops.
    tempfile::tempfile_in(path).map_err(|source| PathError::NotWritable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
