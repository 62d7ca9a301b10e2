use std::path::Path;

use crate::notification::domain::notifier::{NotifyError, Notifier};

/// Notifier that only writes to the log.
///
/// Used when no bot token is configured, so the detector can run
/// locally without a remote endpoint.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_text(&self, message: &str) -> Result<(), NotifyError> {
        log::info!("[notify] {message}");
        Ok(())
    }

    fn send_photo(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        log::info!("[notify] {caption} ({})", path.display());
        Ok(())
    }
}
