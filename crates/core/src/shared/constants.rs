use std::time::Duration;

/// Every frame is normalized to this resolution before detection.
pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

pub const DEFAULT_COOLDOWN_SECS: f64 = 15.0;

pub const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";
pub const SNAPSHOT_PREFIX: &str = "intrusion_";
pub const SNAPSHOT_EXTENSION: &str = "jpg";
/// chrono format for snapshot names and alert messages, e.g. `2024-01-01_12-00-00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub const TEXT_TIMEOUT: Duration = Duration::from_secs(5);
pub const PHOTO_TIMEOUT: Duration = Duration::from_secs(10);
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_NOTIFY_QUEUE_CAPACITY: usize = 16;

pub const STARTUP_MESSAGE: &str = "🔐 Smart Intrusion Detector started.";
pub const SHUTDOWN_MESSAGE: &str = "🛑 Smart Intrusion Detector stopped.";

pub const PERSON_MODEL_NAME: &str = "yolo11n.onnx";
/// COCO class index for "person".
pub const PERSON_CLASS_ID: usize = 0;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Box overlay color (RGB) and stroke width in pixels.
pub const BOX_COLOR: [u8; 3] = [0, 255, 0];
pub const BOX_THICKNESS: u32 = 2;

#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA: &str = "0";
#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA: &str = "/dev/video0";

#[cfg(target_os = "macos")]
pub const DEFAULT_INPUT_FORMAT: Option<&str> = Some("avfoundation");
#[cfg(target_os = "windows")]
pub const DEFAULT_INPUT_FORMAT: Option<&str> = Some("dshow");
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_INPUT_FORMAT: Option<&str> = None;
