use std::path::PathBuf;

use thiserror::Error;

use crate::shared::clock::Timestamp;
use crate::shared::constants::{SNAPSHOT_EXTENSION, SNAPSHOT_PREFIX, TIMESTAMP_FORMAT};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("failed to create snapshot directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write snapshot {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Persists the frame that triggered an alert.
pub trait SnapshotStore: Send {
    /// Saves `frame` under a name derived from `timestamp` and returns its path.
    fn save(&self, frame: &Frame, timestamp: Timestamp) -> Result<PathBuf, SnapshotError>;
}

/// `intrusion_<YYYY-MM-DD_HH-MM-SS>.jpg`, with `_<n>` before the extension
/// when `sequence` is non-zero.
///
/// Zero-padded fields make lexical order match chronological order.
pub fn snapshot_file_name(timestamp: &Timestamp, sequence: u32) -> String {
    let stamp = timestamp.format(TIMESTAMP_FORMAT);
    if sequence == 0 {
        format!("{SNAPSHOT_PREFIX}{stamp}.{SNAPSHOT_EXTENSION}")
    } else {
        format!("{SNAPSHOT_PREFIX}{stamp}_{sequence}.{SNAPSHOT_EXTENSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_file_name_format() {
        let name = snapshot_file_name(&at(2024, 1, 1, 12, 0, 0), 0);
        assert_eq!(name, "intrusion_2024-01-01_12-00-00.jpg");
    }

    #[test]
    fn test_file_name_with_sequence() {
        let name = snapshot_file_name(&at(2024, 1, 1, 12, 0, 0), 2);
        assert_eq!(name, "intrusion_2024-01-01_12-00-00_2.jpg");
    }

    #[test]
    fn test_lexical_order_matches_chronological_order() {
        let stamps = [
            at(2024, 1, 1, 12, 0, 0),
            at(2024, 1, 1, 12, 0, 9),
            at(2024, 1, 1, 12, 0, 10),
            at(2024, 1, 1, 13, 0, 0),
            at(2024, 1, 2, 0, 0, 0),
            at(2024, 2, 1, 0, 0, 0),
            at(2024, 10, 1, 0, 0, 0),
            at(2025, 1, 1, 0, 0, 0),
        ];
        let names: Vec<String> = stamps.iter().map(|t| snapshot_file_name(t, 0)).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_collision_suffix_sorts_after_base_and_before_next_second() {
        let base = snapshot_file_name(&at(2024, 1, 1, 12, 0, 0), 0);
        let dup = snapshot_file_name(&at(2024, 1, 1, 12, 0, 0), 1);
        let next = snapshot_file_name(&at(2024, 1, 1, 12, 0, 1), 0);
        assert!(base < dup);
        assert!(dup < next);
    }
}
