use std::path::PathBuf;

use crate::shared::frame::Frame;
use crate::snapshot::domain::image_writer::ImageWriter;

/// Receives every annotated frame for live viewing.
pub trait PreviewSink: Send {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}

/// Headless mode: frames are dropped.
pub struct NullPreview;

impl PreviewSink for NullPreview {
    fn show(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}

/// Rewrites a single image file with the latest annotated frame.
///
/// Any image viewer that reloads on change can watch the file. Only every
/// `every`-th frame is written to keep disk I/O off the hot path.
pub struct FilePreview {
    path: PathBuf,
    writer: Box<dyn ImageWriter>,
    every: usize,
    seen: usize,
}

impl FilePreview {
    pub fn new(path: impl Into<PathBuf>, writer: Box<dyn ImageWriter>, every: usize) -> Self {
        Self {
            path: path.into(),
            writer,
            every: every.max(1),
            seen: 0,
        }
    }
}

impl PreviewSink for FilePreview {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let due = self.seen % self.every == 0;
        self.seen += 1;
        if due {
            self.writer.write(&self.path, frame)?;
        }
        Ok(())
    }
}
