//! Where snapshots are kept.

use std::fs;
use std::path::{Path, PathBuf};

use super::WorldSnapshot;
use crate::error::PersistError;

/// Keeps the latest snapshot of a world.
pub trait SnapshotStore: Send {
    /// Replaces the stored snapshot.
    fn save(&mut self, snapshot: &WorldSnapshot) -> Result<(), PersistError>;

    /// Reads the stored snapshot.
    fn load(&self) -> Result<WorldSnapshot, PersistError>;
}

/// Keeps the snapshot in memory only. Useful for tests and throwaway worlds.
#[derive(Debug, Default)]
pub struct RamOnlyStore {
    snapshot: Option<WorldSnapshot>,
}

impl RamOnlyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for RamOnlyStore {
    fn save(&mut self, snapshot: &WorldSnapshot) -> Result<(), PersistError> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<WorldSnapshot, PersistError> {
        self.snapshot.clone().ok_or(PersistError::Missing)
    }
}

/// Writes the snapshot as pretty JSON to a single file.
///
/// The file is first written next to its final path and then renamed over
/// it, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&mut self, snapshot: &WorldSnapshot) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        log::debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<WorldSnapshot, PersistError> {
        if !self.path.exists() {
            return Err(PersistError::Missing);
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
