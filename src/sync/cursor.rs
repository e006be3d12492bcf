//! Client-side sync watermark, stored as YAML in the client data directory.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the cursor inside the data directory.
pub const CURSOR_FILE: &str = "sync_state.yaml";

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("Failed to access sync file '{}': {1}", .0.display())]
    Io(PathBuf, #[source] io::Error),
    #[error("Failed to parse sync file '{}': {1}", .0.display())]
    Parse(PathBuf, #[source] serde_yaml::Error),
}

/// Reads a YAML sync file, or the default value if it does not exist yet.
pub(super) fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, CursorError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            serde_yaml::from_str(&contents).map_err(|e| CursorError::Parse(path.to_path_buf(), e))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(CursorError::Io(path.to_path_buf(), e)),
    }
}

/// Writes a YAML sync file, replacing the previous one atomically.
pub(super) fn write_yaml<T: Serialize>(value: &T, path: &Path) -> Result<(), CursorError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CursorError::Io(parent.to_path_buf(), e))?;
    }

    let contents =
        serde_yaml::to_string(value).map_err(|e| CursorError::Parse(path.to_path_buf(), e))?;

    let temp_path = path.with_extension("yaml.tmp");
    std::fs::write(&temp_path, contents).map_err(|e| CursorError::Io(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path).map_err(|e| CursorError::Io(path.to_path_buf(), e))?;

    Ok(())
}

/// The last USN a client has applied and when it last synced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub max_usn: i64,
    /// Server time of the last completed sync, unix seconds.
    pub last_sync_at: i64,
}

impl SyncCursor {
    /// True if the cursor predates the server's full-sync marker.
    pub fn needs_full_sync(&self, full_sync_before: i64) -> bool {
        self.last_sync_at < full_sync_before
    }

    /// Loads the cursor, or the zero cursor if none was saved yet.
    pub fn load(path: &Path) -> Result<Self, CursorError> {
        read_yaml(path)
    }

    /// Saves the cursor, replacing the previous file atomically.
    pub fn save(&self, path: &Path) -> Result<(), CursorError> {
        write_yaml(self, path)
    }
}
