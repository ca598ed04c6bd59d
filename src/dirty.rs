//! Dirty-state marker
//!
//! A zero-length `metadata.dirty` file in the application-state directory
//! records that a repair has rewritten files since the last `reset`.

use crate::error::{RepairError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DIRTY_FILE_NAME: &str = "metadata.dirty";

/// Set, clear, and query the dirty state
pub trait DirtyMarker: Send + Sync {
    fn mark(&self) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn is_dirty(&self) -> bool;

    /// Backend name (for logging)
    fn name(&self) -> &'static str;
}

/// Sentinel file under a state directory
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    /// Ensure the state directory exists and build a marker inside it
    pub fn new(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir).map_err(|e| RepairError::file_write(state_dir, e))?;
        Ok(Self {
            path: state_dir.join(DIRTY_FILE_NAME),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DirtyMarker for FileMarker {
    fn mark(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        fs::write(&self.path, b"").map_err(|e| RepairError::file_write(&self.path, e))?;
        debug!("Marked metadata dirty: {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Cleared dirty marker {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepairError::file_write(&self.path, e)),
        }
    }

    fn is_dirty(&self) -> bool {
        self.path.exists()
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Stand-in used when the state directory is unusable; never dirty
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMarker;

impl DirtyMarker for NoopMarker {
    fn mark(&self) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Build the marker for a state directory, degrading to [`NoopMarker`]
pub fn open(state_dir: Option<&Path>) -> Box<dyn DirtyMarker> {
    let Some(dir) = state_dir else {
        warn!("No application state directory available; dirty tracking disabled");
        return Box::new(NoopMarker);
    };
    match FileMarker::new(dir) {
        Ok(marker) => Box::new(marker),
        Err(e) => {
            warn!("Dirty tracking disabled: {}", e);
            Box::new(NoopMarker)
        }
    }
}
