use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("could not open camera {device}: {reason}")]
    Open { device: String, reason: String },
    #[error("camera is not open")]
    NotOpened,
    #[error("camera stream ended")]
    EndOfStream,
    #[error("failed to read frame: {0}")]
    Read(String),
}

/// What the source reported when it was opened.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// A live, non-restartable sequence of frames.
///
/// `read` is called once per loop iteration; any error from it ends the
/// monitor loop. `release` must be safe to call more than once.
pub trait FrameSource: Send {
    fn open(&mut self) -> Result<SourceInfo, CaptureError>;

    fn read(&mut self) -> Result<Frame, CaptureError>;

    fn release(&mut self);
}
