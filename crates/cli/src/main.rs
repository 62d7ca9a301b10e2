use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use intrusion_core::alerting::alert_controller::AlertController;
use intrusion_core::alerting::alert_dispatcher::AlertDispatcher;
use intrusion_core::capture::infrastructure::ffmpeg_camera_source::FfmpegCameraSource;
use intrusion_core::detection::domain::person_detector::PersonDetector;
use intrusion_core::detection::infrastructure::model_resolver;
use intrusion_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloPersonDetector;
use intrusion_core::notification::domain::notifier::Notifier;
use intrusion_core::notification::infrastructure::log_notifier::LogNotifier;
use intrusion_core::notification::infrastructure::queued_notifier::QueuedNotifier;
use intrusion_core::notification::infrastructure::telegram_notifier::TelegramNotifier;
use intrusion_core::pipeline::monitor_use_case::{MonitorUseCase, StopReason};
use intrusion_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use intrusion_core::pipeline::preview_sink::{FilePreview, NullPreview, PreviewSink};
use intrusion_core::shared::clock::SystemClock;
use intrusion_core::shared::constants::{DEFAULT_NOTIFY_QUEUE_CAPACITY, PERSON_MODEL_NAME};
use intrusion_core::shared::monitor_config::MonitorConfig;
use intrusion_core::snapshot::infrastructure::image_file_writer::ImageFileWriter;
use intrusion_core::snapshot::infrastructure::jpeg_snapshot_store::JpegSnapshotStore;

/// Watches a camera for people and sends Telegram alerts with a snapshot.
///
/// Type `q` and press Enter to stop.
#[derive(Parser)]
#[command(name = "intrusion-detector")]
struct Cli {
    /// Camera device (`/dev/video0`, `0` on macOS, `video=<name>` on Windows) or a video file.
    #[arg(long)]
    camera: Option<String>,

    /// Force an ffmpeg input format (v4l2, avfoundation, dshow).
    #[arg(long)]
    input_format: Option<String>,

    /// Ask the camera for this resolution, e.g. `1280x720`.
    /// Frames are scaled to 640x480 either way.
    #[arg(long, value_parser = parse_video_size)]
    video_size: Option<(u32, u32)>,

    /// Ask the camera for this frame rate.
    #[arg(long)]
    framerate: Option<u32>,

    /// Telegram bot token.
    #[arg(long, env = "INTRUSION_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Telegram chat id that receives alerts.
    #[arg(long, env = "INTRUSION_CHAT_ID")]
    chat_id: Option<String>,

    /// Telegram API root, for a local Bot API server or proxy.
    #[arg(long)]
    api_base: Option<String>,

    /// Minimum seconds between two alerts.
    #[arg(long)]
    cooldown: Option<f64>,

    /// Directory that receives intrusion snapshots.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Person detection model (ONNX). Defaults to the cached model; no model
    /// ships with the binary, so the first run needs this or --model-url.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Where to download the model from when it is not cached. The file is
    /// kept in the per-user cache, so later runs need neither flag.
    #[arg(long)]
    model_url: Option<String>,

    /// Person detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// JSON config file. Command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep this image updated with the latest annotated frame.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Write the preview image every Nth frame.
    #[arg(long)]
    preview_every: Option<usize>,

    /// Send notifications from a background worker so the loop never waits on the network.
    #[arg(long)]
    async_notify: bool,

    /// Capacity of the background notification queue.
    #[arg(long)]
    queue_capacity: Option<usize>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = merge(MonitorConfig::load(cli.config.as_deref())?, cli);
    config.validate()?;

    let detector = build_detector(&config)?;
    let notifier = build_notifier(&config)?;
    let store = JpegSnapshotStore::create(&config.snapshot_dir, Box::new(ImageFileWriter::new()))?;
    log::info!("Snapshots go to {}", store.dir().display());

    let mut source = FfmpegCameraSource::new(&config.camera);
    if let Some(format) = &config.input_format {
        source = source.with_input_format(format);
    }
    if let Some((width, height)) = config.video_size {
        source = source.with_video_size(width, height);
    }
    if let Some(fps) = config.framerate {
        source = source.with_framerate(fps);
    }

    let preview: Box<dyn PreviewSink> = match &config.preview {
        Some(path) => Box::new(FilePreview::new(
            path,
            Box::new(ImageFileWriter::new()),
            config.preview_every,
        )),
        None => Box::new(NullPreview),
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    spawn_quit_watcher(cancelled.clone());

    let mut use_case = MonitorUseCase::new(
        Box::new(source),
        detector,
        AlertController::new(config.cooldown()?),
        AlertDispatcher::new(Box::new(store), notifier),
        Box::new(SystemClock),
        Some(cancelled),
    )
    .with_preview(preview)
    .with_logger(Box::new(StdoutPipelineLogger::default()));

    let summary = use_case.execute()?;
    let reason = match summary.stop_reason {
        StopReason::QuitRequested => "quit requested",
        StopReason::EndOfStream => "camera stream ended",
    };
    log::info!(
        "Stopped ({reason}): {} frames, {} alerts, {} failed notifications",
        summary.frames,
        summary.alerts,
        summary.notification_failures
    );
    Ok(())
}

/// Command-line values win over the config file.
fn merge(mut config: MonitorConfig, cli: Cli) -> MonitorConfig {
    if let Some(camera) = cli.camera {
        config.camera = camera;
    }
    if cli.input_format.is_some() {
        config.input_format = cli.input_format;
    }
    if cli.video_size.is_some() {
        config.video_size = cli.video_size;
    }
    if cli.framerate.is_some() {
        config.framerate = cli.framerate;
    }
    if cli.token.is_some() {
        config.bot_token = cli.token;
    }
    if cli.chat_id.is_some() {
        config.chat_id = cli.chat_id;
    }
    if cli.api_base.is_some() {
        config.api_base = cli.api_base;
    }
    if let Some(cooldown) = cli.cooldown {
        config.cooldown_secs = cooldown;
    }
    if let Some(dir) = cli.snapshot_dir {
        config.snapshot_dir = dir;
    }
    if cli.model.is_some() {
        config.model = cli.model;
    }
    if cli.model_url.is_some() {
        config.model_url = cli.model_url;
    }
    if let Some(confidence) = cli.confidence {
        config.confidence = confidence;
    }
    if cli.preview.is_some() {
        config.preview = cli.preview;
    }
    if let Some(every) = cli.preview_every {
        config.preview_every = every;
    }
    if let Some(capacity) = cli.queue_capacity {
        config.notify_queue = Some(capacity);
    } else if cli.async_notify && config.notify_queue.is_none() {
        config.notify_queue = Some(DEFAULT_NOTIFY_QUEUE_CAPACITY);
    }
    config
}

fn build_detector(
    config: &MonitorConfig,
) -> Result<Box<dyn PersonDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {PERSON_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        PERSON_MODEL_NAME,
        config.model.as_deref(),
        config.model_url.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    Ok(Box::new(OnnxYoloPersonDetector::new(&model_path, config.confidence)?))
}

fn build_notifier(
    config: &MonitorConfig,
) -> Result<Box<dyn Notifier>, Box<dyn std::error::Error>> {
    let notifier: Box<dyn Notifier> = match config.telegram_credentials() {
        Some((token, chat_id)) => {
            let mut telegram = TelegramNotifier::new(token, chat_id)?;
            if let Some(base) = &config.api_base {
                telegram = telegram.with_api_base(base);
            }
            Box::new(telegram)
        }
        None => {
            log::warn!("No Telegram token configured, alerts are only logged");
            Box::new(LogNotifier)
        }
    };

    Ok(match config.notify_queue {
        Some(capacity) => Box::new(QueuedNotifier::new(notifier, capacity)),
        None => notifier,
    })
}

/// Sets `cancelled` when the user types `q`. A closed stdin leaves the
/// monitor running.
fn spawn_quit_watcher(cancelled: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if is_quit(&line) {
                cancelled.store(true, Ordering::Relaxed);
                break;
            }
        }
    });
}

fn parse_video_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let height = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    Ok((width, height))
}

fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q")
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading person detection model... {pct}%");
    } else {
        eprint!("\rDownloading person detection model... {downloaded} bytes");
    }
}
