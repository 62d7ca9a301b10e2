use std::path::PathBuf;
use std::time::Duration;

use crate::shared::clock::Timestamp;
use crate::shared::constants::TIMESTAMP_FORMAT;
use crate::shared::detection::Detection;

/// Whether the controller would let an alert through right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownState {
    CooledDown,
    Suppressed,
}

/// A decision to notify about one intrusion.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertEvent {
    pub timestamp: Timestamp,
    pub message: String,
    pub person_count: usize,
    /// Filled in once the snapshot has been written.
    pub snapshot_path: Option<PathBuf>,
}

impl AlertEvent {
    pub fn new(timestamp: Timestamp, person_count: usize) -> Self {
        let message = format!(
            "🚨 Intrusion detected at {}",
            timestamp.format(TIMESTAMP_FORMAT)
        );
        Self {
            timestamp,
            message,
            person_count,
            snapshot_path: None,
        }
    }
}

/// Cooldown-gated alert decision.
///
/// An alert fires for a non-empty detection when no alert has fired yet,
/// or when strictly more than `cooldown` has elapsed since the last one.
/// Suppressed detections are dropped, never queued. The last-alert time
/// is recorded before the event is handed out, so slow snapshot or
/// notification I/O cannot let a second alert through.
pub struct AlertController {
    cooldown: Duration,
    last_alert: Option<Timestamp>,
}

impl AlertController {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_alert: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_alert(&self) -> Option<Timestamp> {
        self.last_alert
    }

    pub fn state(&self, now: Timestamp) -> CooldownState {
        if self.cooled_down(now) {
            CooldownState::CooledDown
        } else {
            CooldownState::Suppressed
        }
    }

    /// Returns an event if this detection should be reported.
    ///
    /// Any number of boxes counts as one event.
    pub fn evaluate(&mut self, detection: &Detection, now: Timestamp) -> Option<AlertEvent> {
        if detection.is_empty() || !self.cooled_down(now) {
            return None;
        }
        self.last_alert = Some(now);
        Some(AlertEvent::new(now, detection.len()))
    }

    fn cooled_down(&self, now: Timestamp) -> bool {
        let Some(last) = self.last_alert else {
            return true;
        };
        // A clock that went backwards gives a negative delta: still suppressed.
        match (now - last).to_std() {
            Ok(elapsed) => elapsed > self.cooldown,
            Err(_) => false,
        }
    }
}
