use crate::alerting::alert_controller::AlertEvent;
use crate::notification::domain::notifier::Notifier;
use crate::shared::frame::Frame;
use crate::snapshot::domain::snapshot_store::SnapshotStore;

/// What happened while delivering one alert.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub event: AlertEvent,
    pub notification_failures: usize,
}

/// Delivers an alert: snapshot first, then text, then photo.
///
/// Nothing here is allowed to fail the caller. A failed snapshot still
/// sends the text alert and skips the photo; notifier errors are logged
/// and counted.
pub struct AlertDispatcher {
    store: Box<dyn SnapshotStore>,
    notifier: Box<dyn Notifier>,
}

impl AlertDispatcher {
    pub fn new(store: Box<dyn SnapshotStore>, notifier: Box<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn dispatch(&self, frame: &Frame, mut event: AlertEvent) -> DispatchOutcome {
        let mut notification_failures = 0;

        match self.store.save(frame, event.timestamp) {
            Ok(path) => event.snapshot_path = Some(path),
            Err(e) => {
                log::warn!("Snapshot failed: {e}");
                println!("Failed to save snapshot: {e}");
            }
        }

        println!("{}", event.message);

        if let Err(e) = self.notifier.send_text(&event.message) {
            log::warn!("Alert text not delivered: {e}");
            println!("Failed to send alert message: {e}");
            notification_failures += 1;
        }

        match event.snapshot_path.as_deref() {
            Some(path) => {
                if let Err(e) = self.notifier.send_photo(path, &event.message) {
                    log::warn!("Alert photo not delivered: {e}");
                    println!("Failed to send alert photo: {e}");
                    notification_failures += 1;
                }
            }
            None => log::warn!("No snapshot to attach, skipping photo"),
        }

        DispatchOutcome {
            event,
            notification_failures,
        }
    }
}
