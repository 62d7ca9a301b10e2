use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::alerting::alert_controller::AlertController;
use crate::alerting::alert_dispatcher::AlertDispatcher;
use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::detection::domain::person_detector::PersonDetector;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::preview_sink::{NullPreview, PreviewSink};
use crate::shared::annotate::draw_boxes;
use crate::shared::clock::Clock;
use crate::shared::constants::{
    BOX_COLOR, BOX_THICKNESS, FRAME_HEIGHT, FRAME_WIDTH, SHUTDOWN_MESSAGE, STARTUP_MESSAGE,
};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("person detection failed: {0}")]
    Detection(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    QuitRequested,
    EndOfStream,
}

/// Totals for one monitoring session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub alerts: usize,
    pub notification_failures: usize,
    pub stop_reason: StopReason,
}

/// The monitoring loop: read, detect, annotate, gate, dispatch, preview.
///
/// Runs on the calling thread until the cancellation flag is set, the
/// source ends, or a frame cannot be read or analysed. The source is
/// always released and the shutdown notice always attempted once the
/// source has been opened.
pub struct MonitorUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn PersonDetector>,
    controller: AlertController,
    dispatcher: AlertDispatcher,
    clock: Box<dyn Clock>,
    preview: Box<dyn PreviewSink>,
    logger: Box<dyn PipelineLogger>,
    cancelled: Arc<AtomicBool>,
}

impl MonitorUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn PersonDetector>,
        controller: AlertController,
        dispatcher: AlertDispatcher,
        clock: Box<dyn Clock>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source,
            detector,
            controller,
            dispatcher,
            clock,
            preview: Box::new(NullPreview),
            logger: Box::new(NullPipelineLogger),
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn with_preview(mut self, preview: Box<dyn PreviewSink>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn execute(&mut self) -> Result<RunSummary, MonitorError> {
        let info = self.source.open()?;
        self.logger.info(&format!(
            "Camera {} opened: {}x{} at {:.1} fps",
            info.device, info.width, info.height, info.fps
        ));

        let mut stats = Stats::default();
        println!("Starting Smart Intrusion Detector...");
        self.notify(STARTUP_MESSAGE, &mut stats);

        let outcome = self.run_loop(&mut stats);

        self.source.release();
        self.notify(SHUTDOWN_MESSAGE, &mut stats);
        println!("{SHUTDOWN_MESSAGE}");
        self.logger.summary();

        let stop_reason = outcome?;
        Ok(RunSummary {
            frames: stats.frames,
            alerts: stats.alerts,
            notification_failures: stats.notification_failures,
            stop_reason,
        })
    }

    fn run_loop(&mut self, stats: &mut Stats) -> Result<StopReason, MonitorError> {
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                self.logger.info("Quit requested");
                return Ok(StopReason::QuitRequested);
            }

            let t0 = Instant::now();
            let mut frame = match self.source.read() {
                Ok(frame) => frame,
                Err(CaptureError::EndOfStream) => {
                    self.logger.info("Camera stream ended");
                    return Ok(StopReason::EndOfStream);
                }
                Err(e) => {
                    println!("Error: Failed to read frame from webcam");
                    return Err(e.into());
                }
            };
            if frame.width() != FRAME_WIDTH || frame.height() != FRAME_HEIGHT {
                frame = frame.resized(FRAME_WIDTH, FRAME_HEIGHT);
            }
            self.logger.timing("read", elapsed_ms(t0));

            let t0 = Instant::now();
            let detection = self
                .detector
                .detect(&frame)
                .map_err(|e| MonitorError::Detection(e.to_string()))?;
            self.logger.timing("detect", elapsed_ms(t0));
            self.logger.metric("persons", detection.len() as f64);

            draw_boxes(&mut frame, detection.boxes(), BOX_COLOR, BOX_THICKNESS);

            if let Some(event) = self.controller.evaluate(&detection, self.clock.now()) {
                let t0 = Instant::now();
                let outcome = self.dispatcher.dispatch(&frame, event);
                self.logger.timing("dispatch", elapsed_ms(t0));
                stats.alerts += 1;
                stats.notification_failures += outcome.notification_failures;
            }

            if let Err(e) = self.preview.show(&frame) {
                log::warn!("Preview update failed: {e}");
            }

            stats.frames += 1;
            self.logger.progress(stats.frames);
        }
    }

    fn notify(&self, message: &str, stats: &mut Stats) {
        if let Err(e) = self.dispatcher.notifier().send_text(message) {
            log::warn!("Status message not delivered: {e}");
            println!("Error sending Telegram message: {e}");
            stats.notification_failures += 1;
        }
    }
}

#[derive(Default)]
struct Stats {
    frames: usize,
    alerts: usize,
    notification_failures: usize,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::frame_source::SourceInfo;
    use crate::notification::domain::notifier::{NotifyError, Notifier};
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::clock::Timestamp;
    use crate::shared::detection::Detection;
    use crate::shared::frame::Frame;
    use crate::snapshot::domain::snapshot_store::{SnapshotError, SnapshotStore};
    use chrono::{Local, TimeZone};
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;
    type SeenSizes = Arc<Mutex<Vec<(u32, u32)>>>;

    // --- Stubs ---

    enum Step {
        Frame(bool),
        Fail,
    }

    /// Yields frames with or without a person, then ends the stream.
    struct StubSource {
        steps: VecDeque<Step>,
        fail_open: bool,
        released: Arc<Mutex<usize>>,
        width: u32,
        height: u32,
        index: usize,
    }

    impl StubSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                fail_open: false,
                released: Arc::new(Mutex::new(0)),
                width: FRAME_WIDTH,
                height: FRAME_HEIGHT,
                index: 0,
            }
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self) -> Result<SourceInfo, CaptureError> {
            if self.fail_open {
                return Err(CaptureError::Open {
                    device: "/dev/video0".to_string(),
                    reason: "No such device".to_string(),
                });
            }
            Ok(SourceInfo {
                device: "stub".to_string(),
                width: self.width,
                height: self.height,
                fps: 30.0,
            })
        }

        fn read(&mut self) -> Result<Frame, CaptureError> {
            match self.steps.pop_front() {
                None => Err(CaptureError::EndOfStream),
                Some(Step::Fail) => Err(CaptureError::Read("device unplugged".to_string())),
                Some(Step::Frame(person)) => {
                    let len = (self.width * self.height * 3) as usize;
                    // Red marks a person for the stub detector
                    let fill = if person { 255 } else { 0 };
                    let frame = Frame::new(vec![fill; len], self.width, self.height, 3, self.index);
                    self.index += 1;
                    Ok(frame)
                }
            }
        }

        fn release(&mut self) {
            *self.released.lock().unwrap() += 1;
        }
    }

    struct StubDetector {
        fail: bool,
        seen_sizes: SeenSizes,
    }

    impl PersonDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Detection, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("session run failed".into());
            }
            self.seen_sizes
                .lock()
                .unwrap()
                .push((frame.width(), frame.height()));
            // Pixel (1,1) sits inside the box outline, so it is still the raw fill
            let marker = frame.data()[(frame.width() as usize + 1) * 3];
            if marker == 255 {
                Ok(Detection::new(vec![BoundingBox::new(10, 10, 100, 200, 0.9)]))
            } else {
                Ok(Detection::empty())
            }
        }
    }

    /// Each frame advances the clock by `step`.
    struct SteppingClock {
        now: Mutex<Timestamp>,
        step: chrono::Duration,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> Timestamp {
            let mut now = self.now.lock().unwrap();
            let current = *now;
            *now = current + self.step;
            current
        }
    }

    struct StubStore {
        log: Log,
        fail: bool,
    }

    impl SnapshotStore for StubStore {
        fn save(&self, _frame: &Frame, timestamp: Timestamp) -> Result<PathBuf, SnapshotError> {
            if self.fail {
                return Err(SnapshotError::MissingDirectory(PathBuf::from("snapshots")));
            }
            let path = PathBuf::from(format!("snap-{}.jpg", timestamp.timestamp()));
            self.log.lock().unwrap().push(format!("save:{}", path.display()));
            Ok(path)
        }
    }

    struct StubNotifier {
        log: Log,
        fail: bool,
    }

    impl Notifier for StubNotifier {
        fn send_text(&self, message: &str) -> Result<(), NotifyError> {
            self.log.lock().unwrap().push(format!("text:{message}"));
            if self.fail {
                Err(NotifyError::Disconnected)
            } else {
                Ok(())
            }
        }

        fn send_photo(&self, path: &Path, _caption: &str) -> Result<(), NotifyError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("photo:{}", path.display()));
            if self.fail {
                Err(NotifyError::Disconnected)
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        source: StubSource,
        detector_fails: bool,
        store_fails: bool,
        notifier_fails: bool,
        step_secs: i64,
        cancelled: Option<Arc<AtomicBool>>,
    }

    impl Harness {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                source: StubSource::new(steps),
                detector_fails: false,
                store_fails: false,
                notifier_fails: false,
                step_secs: 1,
                cancelled: None,
            }
        }

        fn build(self, log: &Log) -> (MonitorUseCase, Arc<Mutex<usize>>, SeenSizes) {
            let released = self.source.released.clone();
            let seen_sizes = Arc::new(Mutex::new(Vec::new()));
            let dispatcher = AlertDispatcher::new(
                Box::new(StubStore {
                    log: log.clone(),
                    fail: self.store_fails,
                }),
                Box::new(StubNotifier {
                    log: log.clone(),
                    fail: self.notifier_fails,
                }),
            );
            let use_case = MonitorUseCase::new(
                Box::new(self.source),
                Box::new(StubDetector {
                    fail: self.detector_fails,
                    seen_sizes: seen_sizes.clone(),
                }),
                AlertController::new(Duration::from_secs(15)),
                dispatcher,
                Box::new(SteppingClock {
                    now: Mutex::new(Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
                    step: chrono::Duration::seconds(self.step_secs),
                }),
                self.cancelled,
            );
            (use_case, released, seen_sizes)
        }
    }

    fn texts(log: &Log) -> Vec<String> {
        log.lock()
            .unwrap()
            .iter()
            .filter(|l| l.starts_with("text:"))
            .cloned()
            .collect()
    }

    // --- Tests ---

    #[test]
    fn test_first_person_alerts_then_cooldown_suppresses() {
        let log = Log::default();
        // Person on every frame, clock advancing 1s per frame: alerts at t=0 and t=16
        let steps = (0..20).map(|_| Step::Frame(true)).collect();
        let (mut use_case, released, _) = Harness::new(steps).build(&log);

        let summary = use_case.execute().unwrap();

        assert_eq!(summary.frames, 20);
        assert_eq!(summary.alerts, 2);
        assert_eq!(summary.notification_failures, 0);
        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(*released.lock().unwrap(), 1);

        let texts = texts(&log);
        assert_eq!(texts.first().unwrap(), &format!("text:{STARTUP_MESSAGE}"));
        assert_eq!(texts.last().unwrap(), &format!("text:{SHUTDOWN_MESSAGE}"));
        assert_eq!(texts[1], "text:🚨 Intrusion detected at 2024-01-01_12-00-00");
        assert_eq!(texts[2], "text:🚨 Intrusion detected at 2024-01-01_12-00-16");
    }

    #[test]
    fn test_alert_sequence_is_snapshot_text_photo() {
        let log = Log::default();
        let (mut use_case, _, _) = Harness::new(vec![Step::Frame(true)]).build(&log);
        use_case.execute().unwrap();

        let log = log.lock().unwrap();
        assert!(log[1].starts_with("save:"));
        assert!(log[2].starts_with("text:🚨"));
        assert!(log[3].starts_with("photo:"));
    }

    #[test]
    fn test_empty_frames_never_alert() {
        let log = Log::default();
        let steps = (0..5).map(|_| Step::Frame(false)).collect();
        let (mut use_case, _, _) = Harness::new(steps).build(&log);

        let summary = use_case.execute().unwrap();
        assert_eq!(summary.alerts, 0);
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_notifier_failures_do_not_stop_the_loop() {
        let log = Log::default();
        let steps = vec![Step::Frame(true), Step::Frame(false), Step::Frame(false)];
        let mut harness = Harness::new(steps);
        harness.notifier_fails = true;
        let (mut use_case, _, _) = harness.build(&log);

        let summary = use_case.execute().unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.alerts, 1);
        // startup + alert text + alert photo + shutdown
        assert_eq!(summary.notification_failures, 4);
    }

    #[test]
    fn test_snapshot_failure_still_sends_text() {
        let log = Log::default();
        let mut harness = Harness::new(vec![Step::Frame(true)]);
        harness.store_fails = true;
        let (mut use_case, _, _) = harness.build(&log);

        let summary = use_case.execute().unwrap();
        assert_eq!(summary.alerts, 1);

        let log = log.lock().unwrap();
        assert!(log.iter().any(|l| l.starts_with("text:🚨")));
        assert!(!log.iter().any(|l| l.starts_with("photo:")));
    }

    #[test]
    fn test_open_failure_sends_nothing() {
        let log = Log::default();
        let mut harness = Harness::new(vec![Step::Frame(true)]);
        harness.source.fail_open = true;
        let (mut use_case, released, _) = harness.build(&log);

        let err = use_case.execute().unwrap_err();
        assert!(matches!(err, MonitorError::Capture(CaptureError::Open { .. })));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(*released.lock().unwrap(), 0);
    }

    #[test]
    fn test_read_failure_is_fatal_after_cleanup() {
        let log = Log::default();
        let (mut use_case, released, _) =
            Harness::new(vec![Step::Frame(false), Step::Fail, Step::Frame(true)]).build(&log);

        let err = use_case.execute().unwrap_err();
        assert!(matches!(err, MonitorError::Capture(CaptureError::Read(_))));
        assert_eq!(*released.lock().unwrap(), 1);
        assert_eq!(
            texts(&log).last().unwrap(),
            &format!("text:{SHUTDOWN_MESSAGE}")
        );
    }

    #[test]
    fn test_detector_failure_is_fatal_after_cleanup() {
        let log = Log::default();
        let mut harness = Harness::new(vec![Step::Frame(true)]);
        harness.detector_fails = true;
        let (mut use_case, released, _) = harness.build(&log);

        let err = use_case.execute().unwrap_err();
        assert!(matches!(err, MonitorError::Detection(ref m) if m == "session run failed"));
        assert_eq!(*released.lock().unwrap(), 1);
        assert_eq!(texts(&log).len(), 2);
    }

    #[test]
    fn test_cancel_flag_stops_before_next_read() {
        let log = Log::default();
        let cancelled = Arc::new(AtomicBool::new(true));
        let mut harness = Harness::new(vec![Step::Frame(true)]);
        harness.cancelled = Some(cancelled);
        let (mut use_case, released, _) = harness.build(&log);

        let summary = use_case.execute().unwrap();
        assert_eq!(summary.stop_reason, StopReason::QuitRequested);
        assert_eq!(summary.frames, 0);
        assert_eq!(*released.lock().unwrap(), 1);
        assert_eq!(
            texts(&log),
            vec![
                format!("text:{STARTUP_MESSAGE}"),
                format!("text:{SHUTDOWN_MESSAGE}"),
            ]
        );
    }

    #[test]
    fn test_frames_are_resized_before_detection() {
        let log = Log::default();
        let mut harness = Harness::new(vec![Step::Frame(false), Step::Frame(false)]);
        harness.source.width = 320;
        harness.source.height = 240;
        let (mut use_case, _, seen_sizes) = harness.build(&log);

        use_case.execute().unwrap();
        assert_eq!(
            *seen_sizes.lock().unwrap(),
            vec![(FRAME_WIDTH, FRAME_HEIGHT), (FRAME_WIDTH, FRAME_HEIGHT)]
        );
    }
}
