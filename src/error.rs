//! Unified error types for mp3repair
//!
//! Error strategy:
//! - Per-track errors (tag decode, file I/O, backup): recoverable, recorded
//!   against the track and reported at the end of the command
//! - System errors (missing music root, unusable settings): fatal, abort
//!
//! The `Display` text of the tag-level variants is exactly the cause string
//! stored in a track's metadata record.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which of the two tag dialects an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagVersion {
    V1,
    V2,
}

impl std::fmt::Display for TagVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagVersion::V1 => f.write_str("ID3V1"),
            TagVersion::V2 => f.write_str("ID3V2"),
        }
    }
}

/// Top-level error type for mp3repair operations
#[derive(Debug, Error)]
pub enum RepairError {
    // =========================================================================
    // File system errors - recoverable per track
    // =========================================================================
    #[error("cannot open '{}': {source}", path.display())]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write '{}': {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot rename temporary file over '{}': {source}", path.display())]
    FileRename {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot stat '{}': {source}", path.display())]
    FileStat {
        path: PathBuf,
        source: std::io::Error,
    },

    // =========================================================================
    // Tag errors - populate a source's error cause
    // =========================================================================
    #[error("no {0} metadata found")]
    TagMissing(TagVersion),

    #[error("{0}")]
    TagMalformed(String),

    #[error("{0}")]
    TrackNumberMalformed(&'static str),

    // =========================================================================
    // Repair errors - abort the repair of one track
    // =========================================================================
    #[error("backup of '{}' failed: {reason}", path.display())]
    BackupFailed { path: PathBuf, reason: String },

    // =========================================================================
    // Fatal errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type alias for mp3repair operations
pub type Result<T> = std::result::Result<T, RepairError>;

impl RepairError {
    /// Returns true if this error is recoverable (record against the track, continue)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RepairError::ConfigError(_))
    }

    /// Returns true if this error only says a tag region is absent
    pub fn is_missing_tag(&self) -> bool {
        matches!(self, RepairError::TagMissing(_))
    }

    pub fn file_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepairError::FileOpen {
            path: path.into(),
            source,
        }
    }

    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepairError::FileRead {
            path: path.into(),
            source,
        }
    }

    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepairError::FileWrite {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        RepairError::TagMalformed(reason.into())
    }

    /// Create a backup error, naming common causes
    pub fn backup_failed(path: &Path, err: std::io::Error) -> Self {
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => format!(
                "permission denied; check that you have write access to {}",
                path.parent().map(|p| p.display().to_string()).unwrap_or_default()
            ),
            std::io::ErrorKind::NotFound => "source file vanished before it could be copied".to_string(),
            _ => err.to_string(),
        };
        RepairError::BackupFailed {
            path: path.to_path_buf(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_missing_message() {
        assert_eq!(
            RepairError::TagMissing(TagVersion::V1).to_string(),
            "no ID3V1 metadata found"
        );
        assert_eq!(
            RepairError::TagMissing(TagVersion::V2).to_string(),
            "no ID3V2 metadata found"
        );
    }

    #[test]
    fn test_recoverable_split() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(RepairError::file_open("/a.mp3", io).is_recoverable());
        assert!(RepairError::malformed("bad").is_recoverable());
        assert!(!RepairError::ConfigError("x".into()).is_recoverable());
    }

    #[test]
    fn test_backup_failed_permission_reason() {
        let err = RepairError::backup_failed(
            Path::new("/music/a/b/01 x.mp3"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().contains("permission denied"));
    }
}
