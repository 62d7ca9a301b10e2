use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError};

use crate::notification::domain::notifier::{NotifyError, Notifier};

enum Job {
    Text(String),
    Photo(PathBuf, String),
}

/// Moves notification I/O off the monitor thread.
///
/// Messages go through a bounded queue to a single worker that calls the
/// wrapped notifier in order. When the queue is full the message is
/// dropped and `NotifyError::QueueFull` is returned, so a dead endpoint
/// cannot grow memory without bound. Dropping the notifier delivers
/// everything already queued before returning.
pub struct QueuedNotifier {
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl QueuedNotifier {
    pub fn new(inner: Box<dyn Notifier>, capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded::<Job>(capacity.max(1));

        let worker = thread::spawn(move || {
            for job in rx {
                let result = match &job {
                    Job::Text(message) => inner.send_text(message),
                    Job::Photo(path, caption) => inner.send_photo(path, caption),
                };
                if let Err(e) = result {
                    log::warn!("Queued notification failed: {e}");
                    println!("Notification failed: {e}");
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    fn enqueue(&self, job: Job) -> Result<(), NotifyError> {
        let tx = self.tx.as_ref().ok_or(NotifyError::Disconnected)?;
        tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Disconnected(_) => NotifyError::Disconnected,
        })
    }
}

impl Notifier for QueuedNotifier {
    fn send_text(&self, message: &str) -> Result<(), NotifyError> {
        self.enqueue(Job::Text(message.to_string()))
    }

    fn send_photo(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        self.enqueue(Job::Photo(path.to_path_buf(), caption.to_string()))
    }
}

impl Drop for QueuedNotifier {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Notification worker panicked");
            }
        }
    }
}
