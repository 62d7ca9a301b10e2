use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::shared::frame::Frame;
use crate::snapshot::domain::image_writer::ImageWriter;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Writes a single frame to an image file using the `image` crate.
///
/// JPEG output uses a configurable quality; other extensions go through
/// the `image` crate's format detection.
pub struct ImageFileWriter {
    jpeg_quality: u8,
}

impl ImageFileWriter {
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg"));

        if is_jpeg {
            let file = BufWriter::new(File::create(path)?);
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(file, self.jpeg_quality);
            img.write_with_encoder(encoder)?;
        } else {
            img.save(path)?;
        }
        Ok(())
    }
}
