use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::clock::Timestamp;
use crate::shared::frame::Frame;
use crate::snapshot::domain::image_writer::ImageWriter;
use crate::snapshot::domain::snapshot_store::{snapshot_file_name, SnapshotError, SnapshotStore};

/// Highest `_<n>` suffix tried before giving up on a unique name.
const MAX_SEQUENCE: u32 = 999;

/// Stores alert snapshots as timestamped JPEG files in one directory.
///
/// Two alerts within the same second get `_1`, `_2`, ... suffixes instead
/// of overwriting each other.
pub struct JpegSnapshotStore {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
}

impl JpegSnapshotStore {
    /// Creates the snapshot directory if needed. Called once at startup.
    pub fn create(
        dir: impl Into<PathBuf>,
        writer: Box<dyn ImageWriter>,
    ) -> Result<Self, SnapshotError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SnapshotError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir, writer })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn unique_path(&self, timestamp: &Timestamp) -> PathBuf {
        (0..=MAX_SEQUENCE)
            .map(|seq| self.dir.join(snapshot_file_name(timestamp, seq)))
            .find(|path| !path.exists())
            .unwrap_or_else(|| self.dir.join(snapshot_file_name(timestamp, MAX_SEQUENCE)))
    }
}

impl SnapshotStore for JpegSnapshotStore {
    fn save(&self, frame: &Frame, timestamp: Timestamp) -> Result<PathBuf, SnapshotError> {
        if !self.dir.is_dir() {
            return Err(SnapshotError::MissingDirectory(self.dir.clone()));
        }

        let path = self.unique_path(&timestamp);
        self.writer
            .write(&path, frame)
            .map_err(|e| SnapshotError::Write {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        log::debug!("Snapshot saved to {}", path.display());
        Ok(path)
    }
}
