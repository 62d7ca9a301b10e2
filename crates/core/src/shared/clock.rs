use chrono::{DateTime, Local};

pub type Timestamp = DateTime<Local>;

/// Source of the "current time" fed to the alert controller.
pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

/// Wall clock in the local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now()
    }
}
