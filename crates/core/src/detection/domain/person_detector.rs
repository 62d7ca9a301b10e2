use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for person detection.
///
/// Implementations may keep internal model state between calls, hence
/// `&mut self`. Errors are treated as fatal by the monitor loop.
pub trait PersonDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Detection, Box<dyn std::error::Error>>;
}
