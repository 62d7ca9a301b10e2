use std::thread;
use std::time::Duration;

use crate::capture::domain::frame_source::{CaptureError, FrameSource, SourceInfo};
use crate::shared::frame::Frame;

/// Pause before polling a device that has no packet ready yet.
const RETRY_BACKOFF: Duration = Duration::from_millis(5);

/// Captures frames from a camera (or any ffmpeg-readable input) via ffmpeg-next.
///
/// `device` is whatever the selected demuxer understands: `/dev/video0` for
/// v4l2, `0` for avfoundation, `video=<name>` for dshow, or a file/URL when
/// no input format is forced. Each decoded frame is converted to RGB24.
pub struct FfmpegCameraSource {
    device: String,
    input_format: Option<String>,
    video_size: Option<(u32, u32)>,
    framerate: Option<u32>,
    stream: Option<OpenStream>,
}

// Safety: FfmpegCameraSource is only used from the monitor thread.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCameraSource {}

impl FfmpegCameraSource {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            input_format: None,
            video_size: None,
            framerate: None,
            stream: None,
        }
    }

    /// Forces a demuxer (`v4l2`, `avfoundation`, `dshow`, ...) instead of probing.
    pub fn with_input_format(mut self, format: impl Into<String>) -> Self {
        self.input_format = Some(format.into());
        self
    }

    /// Requests a capture resolution from the device.
    pub fn with_video_size(mut self, width: u32, height: u32) -> Self {
        self.video_size = Some((width, height));
        self
    }

    pub fn with_framerate(mut self, fps: u32) -> Self {
        self.framerate = Some(fps);
        self
    }

    fn open_error(&self, reason: impl ToString) -> CaptureError {
        CaptureError::Open {
            device: self.device.clone(),
            reason: reason.to_string(),
        }
    }

    fn open_input(&self) -> Result<ffmpeg_next::format::context::Input, CaptureError> {
        let mut options = ffmpeg_next::Dictionary::new();
        if let Some((w, h)) = self.video_size {
            options.set("video_size", &format!("{w}x{h}"));
        }
        if let Some(fps) = self.framerate {
            options.set("framerate", &fps.to_string());
        }

        let Some(name) = self.input_format.as_deref() else {
            return ffmpeg_next::format::input_with_dictionary(&self.device, options)
                .map_err(|e| self.open_error(e));
        };

        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == name)
            .ok_or_else(|| self.open_error(format!("input format '{name}' is not available")))?;
        let context = ffmpeg_next::format::open_with(
            &self.device,
            &ffmpeg_next::format::format::Format::Input(format),
            options,
        )
        .map_err(|e| self.open_error(e))?;

        match context {
            ffmpeg_next::format::context::Context::Input(input) => Ok(input),
            ffmpeg_next::format::context::Context::Output(_) => {
                Err(self.open_error("device opened as an output"))
            }
        }
    }
}

impl FrameSource for FfmpegCameraSource {
    fn open(&mut self) -> Result<SourceInfo, CaptureError> {
        ffmpeg_next::init().map_err(|e| self.open_error(e))?;
        ffmpeg_next::device::register_all();

        let ictx = self.open_input()?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| self.open_error("no video stream found"))?;
        let video_stream_index = stream.index();

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| self.open_error(e))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| self.open_error(e))?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| self.open_error(e))?;

        self.stream = Some(OpenStream {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
            frame_index: 0,
            eof: false,
        });

        Ok(SourceInfo {
            device: self.device.clone(),
            width,
            height,
            fps,
        })
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        self.stream
            .as_mut()
            .ok_or(CaptureError::NotOpened)?
            .next_frame()
    }

    fn release(&mut self) {
        self.stream = None;
    }
}

/// Demuxer, decoder and RGB converter for an opened device.
struct OpenStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    eof: bool,
}

impl OpenStream {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(frame);
            }
            if self.eof {
                return Err(CaptureError::EndOfStream);
            }

            let mut packet = ffmpeg_next::Packet::empty();
            if let Err(e) = packet.read(&mut self.ictx) {
                match classify_read_error(e) {
                    ReadFailure::EndOfStream => {
                        let _ = self.decoder.send_eof();
                        self.eof = true;
                    }
                    ReadFailure::NotReady => {
                        log::trace!("No packet ready, retrying in {RETRY_BACKOFF:?}");
                        thread::sleep(RETRY_BACKOFF);
                    }
                    ReadFailure::Fatal(err) => return Err(err),
                }
                continue;
            }

            if packet.stream() != self.video_stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

enum ReadFailure {
    EndOfStream,
    /// The device has nothing yet (EAGAIN); try again shortly.
    NotReady,
    Fatal(CaptureError),
}

fn classify_read_error(err: ffmpeg_next::Error) -> ReadFailure {
    match err {
        ffmpeg_next::Error::Eof => ReadFailure::EndOfStream,
        ffmpeg_next::Error::Other { errno } if errno == ffmpeg_next::error::EAGAIN => {
            ReadFailure::NotReady
        }
        e => ReadFailure::Fatal(CaptureError::Read(e.to_string())),
    }
}
