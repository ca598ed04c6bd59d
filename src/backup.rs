//! Pre-repair backups
//!
//! Before a track is rewritten, its file is copied into
//! `<album>/pre-repair-backup/`. A later repair of the same track overwrites
//! the earlier copy. `postrepair` removes the whole directory.

use crate::error::{RepairError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the per-album backup directory
pub const BACKUP_DIR_NAME: &str = "pre-repair-backup";

pub fn backup_dir(album_path: &Path) -> PathBuf {
    album_path.join(BACKUP_DIR_NAME)
}

/// Copy a track into its album's backup directory, returning the copy's path
pub fn backup(track_path: &Path, album_path: &Path) -> Result<PathBuf> {
    let dir = backup_dir(album_path);
    fs::create_dir_all(&dir).map_err(|e| RepairError::backup_failed(&dir, e))?;

    let file_name = track_path.file_name().ok_or_else(|| RepairError::BackupFailed {
        path: track_path.to_path_buf(),
        reason: "path has no file name".to_string(),
    })?;
    let destination = dir.join(file_name);
    fs::copy(track_path, &destination).map_err(|e| RepairError::backup_failed(track_path, e))?;
    debug!(
        "Backed up {} to {}",
        track_path.display(),
        destination.display()
    );
    Ok(destination)
}

/// Delete an album's backup directory. A missing directory is not an error.
///
/// Returns true when a directory was removed.
pub fn cleanup(album_path: &Path) -> Result<bool> {
    let dir = backup_dir(album_path);
    match fs::remove_dir_all(&dir) {
        Ok(()) => {
            info!("Removed {}", dir.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RepairError::FileWrite {
            path: dir,
            source: e,
        }),
    }
}
