//! Snapshot Store
//!
//! Durable JSON snapshot of tracker + scheduler state. Loads everything at
//! startup and saves everything after state changes; writes go to a
//! temporary file first and atomically replace the target so a crash never
//! leaves a torn snapshot behind.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use patentwatch_models::StateSnapshot;
use patentwatch_utils::{PatentwatchError, PatentwatchResult};

pub struct SnapshotStore {
    path: PathBuf,
    // Serializes concurrent writers: the rename is atomic but the shared
    // temp file is not, so saves must not overlap.
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` when no snapshot exists yet.
    ///
    /// A snapshot with an unknown version is rejected rather than partially
    /// interpreted; the caller starts fresh and reports the discard.
    pub fn load(&self) -> PatentwatchResult<Option<StateSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let snapshot: StateSnapshot = serde_json::from_str(&contents)
            .map_err(|e| PatentwatchError::persistence(format!("invalid snapshot: {}", e)))?;

        if !snapshot.is_current_version() {
            return Err(PatentwatchError::persistence(format!(
                "snapshot version {} is not supported",
                snapshot.version
            )));
        }

        Ok(Some(snapshot))
    }

    /// Save the snapshot atomically (write temp, then rename over target).
    /// Writers are serialized, so concurrent saves are last-writer-wins.
    pub fn save(&self, snapshot: &StateSnapshot) -> PatentwatchResult<()> {
        let contents = serde_json::to_string_pretty(snapshot)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PatentwatchError::persistence("snapshot writer lock poisoned"))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents.as_bytes())?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}
