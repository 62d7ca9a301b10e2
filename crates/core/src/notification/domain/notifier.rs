use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Every way a notification can fail. Callers log these and move on.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation} rejected with HTTP {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("cannot read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("notification queue is full, message dropped")]
    QueueFull,
    #[error("notification worker has stopped")]
    Disconnected,
}

/// Outbound alert channel.
///
/// Both operations make a single attempt; there is no retry or queuing of
/// failed messages.
pub trait Notifier: Send {
    fn send_text(&self, message: &str) -> Result<(), NotifyError>;

    fn send_photo(&self, path: &Path, caption: &str) -> Result<(), NotifyError>;
}
