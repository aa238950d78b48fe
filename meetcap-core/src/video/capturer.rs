use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::models::config::SessionConfig;
use crate::models::error::CaptureError;
use crate::traits::video_backend::{VideoBackend, VideoSink};
use crate::video::frame::VideoFrame;

/// Screen recorder: one background loop grabbing snapshots and appending
/// them to a video container writer.
///
/// Each captured frame is written once plus `frame_duplication` extra
/// copies — a fixed-ratio approximation of the nominal frame rate rather
/// than timestamp-based pacing. There is no backpressure: if grabbing is
/// slower than the nominal rate, playback runs slower than wall clock.
pub struct VideoCapturer<B: VideoBackend> {
    backend: B,
    fps: f64,
    frame_duplication: usize,
    output_directory: PathBuf,
    started: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl<B: VideoBackend> VideoCapturer<B> {
    pub fn new(backend: B, config: &SessionConfig) -> Self {
        Self {
            backend,
            fps: config.video_fps,
            frame_duplication: config.frame_duplication,
            output_directory: config.output_directory.clone(),
            started: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Path the capturer writes for a given session.
    pub fn output_path(&self, session_id: &str) -> PathBuf {
        self.output_directory.join(format!(
            "video_{session_id}.{}",
            self.backend.container_extension()
        ))
    }

    /// Start capturing to `video_<session_id>`.
    ///
    /// A no-op (with a warning) while already started. Backend failures —
    /// no screen source, missing codec — abort the start and propagate.
    pub fn start(&mut self, session_id: &str) -> Result<(), CaptureError> {
        if self.started.load(Ordering::SeqCst) {
            log::warn!("video capture already started; ignoring start request");
            return Ok(());
        }

        let size = self.backend.screen_size()?;
        let path = self.output_path(session_id);
        let mut source = self.backend.open_source()?;
        let mut sink = self.backend.open_writer(&path, size, self.fps)?;

        self.started.store(true, Ordering::SeqCst);
        let started = Arc::clone(&self.started);
        let duplication = self.frame_duplication;

        let handle = thread::Builder::new()
            .name("video-capture".into())
            .spawn(move || {
                while started.load(Ordering::SeqCst) {
                    let frame = match source.grab() {
                        Ok(frame) => frame,
                        Err(e) => {
                            log::error!("screen grab failed: {e}");
                            break;
                        }
                    };
                    let frame = frame.into_rgb();
                    if let Err(e) = write_duplicated(sink.as_mut(), &frame, duplication) {
                        log::error!("video write failed: {e}");
                        break;
                    }
                }
                // The loop owns the writer; releasing here, before the stop
                // join returns, rules out writer-after-release races.
                if let Err(e) = sink.release() {
                    log::error!("video writer release failed: {e}");
                }
                started.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.started.store(false, Ordering::SeqCst);
                CaptureError::VideoBackend(format!("failed to spawn video thread: {e}"))
            })?;

        self.handle = Some(handle);
        log::info!("video capture started for session {session_id}");
        Ok(())
    }

    /// Clear the capture flag and wait for the loop to flush and exit.
    pub fn stop(&mut self) {
        self.started.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn write_duplicated(
    sink: &mut dyn VideoSink,
    frame: &VideoFrame,
    extra_copies: usize,
) -> Result<(), CaptureError> {
    sink.write_frame(frame)?;
    for _ in 0..extra_copies {
        sink.write_frame(frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::traits::video_backend::ScreenSource;
    use crate::video::frame::PixelFormat;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Write(Vec<u8>),
        Release,
    }

    struct ScriptedSource {
        frames: Receiver<VideoFrame>,
    }

    impl ScreenSource for ScriptedSource {
        fn grab(&mut self) -> Result<VideoFrame, CaptureError> {
            self.frames
                .recv()
                .map_err(|_| CaptureError::VideoBackend("screen source exhausted".into()))
        }
    }

    struct EndlessSource;

    impl ScreenSource for EndlessSource {
        fn grab(&mut self) -> Result<VideoFrame, CaptureError> {
            Ok(test_frame(0))
        }
    }

    struct RecordingSink {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl VideoSink for RecordingSink {
        fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), CaptureError> {
            self.events.lock().push(Event::Write(frame.data.clone()));
            Ok(())
        }

        fn release(&mut self) -> Result<(), CaptureError> {
            self.events.lock().push(Event::Release);
            Ok(())
        }
    }

    struct FakeBackend {
        // Present for scripted sources; the receiver moves into the source
        // at open time. Endless sources leave it None.
        frame_rx: Mutex<Option<Receiver<VideoFrame>>>,
        fail_writer: bool,
        events: Arc<Mutex<Vec<Event>>>,
        writers_opened: Arc<Mutex<u32>>,
    }

    impl FakeBackend {
        fn scripted() -> (Self, Sender<VideoFrame>) {
            let (tx, rx) = mpsc::channel();
            let backend = Self {
                frame_rx: Mutex::new(Some(rx)),
                fail_writer: false,
                events: Arc::new(Mutex::new(Vec::new())),
                writers_opened: Arc::new(Mutex::new(0)),
            };
            (backend, tx)
        }

        fn endless() -> Self {
            Self {
                frame_rx: Mutex::new(None),
                fail_writer: false,
                events: Arc::new(Mutex::new(Vec::new())),
                writers_opened: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl VideoBackend for FakeBackend {
        fn screen_size(&self) -> Result<(u32, u32), CaptureError> {
            Ok((2, 1))
        }

        fn open_source(&self) -> Result<Box<dyn ScreenSource>, CaptureError> {
            match self.frame_rx.lock().take() {
                Some(rx) => Ok(Box::new(ScriptedSource { frames: rx })),
                None => Ok(Box::new(EndlessSource)),
            }
        }

        fn open_writer(
            &self,
            _path: &Path,
            _size: (u32, u32),
            _fps: f64,
        ) -> Result<Box<dyn VideoSink>, CaptureError> {
            if self.fail_writer {
                return Err(CaptureError::VideoBackend("codec missing".into()));
            }
            *self.writers_opened.lock() += 1;
            Ok(Box::new(RecordingSink {
                events: Arc::clone(&self.events),
            }))
        }

        fn container_extension(&self) -> &str {
            "avi"
        }
    }

    fn test_frame(tag: u8) -> VideoFrame {
        VideoFrame {
            width: 2,
            height: 1,
            format: PixelFormat::Rgb,
            data: vec![tag; 6],
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            output_directory: PathBuf::from("output"),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn each_captured_frame_is_written_six_times() {
        let (backend, tx) = FakeBackend::scripted();
        let events = Arc::clone(&backend.events);
        let mut capturer = VideoCapturer::new(backend, &test_config());

        capturer.start("v1").unwrap();
        tx.send(test_frame(1)).unwrap();
        tx.send(test_frame(2)).unwrap();
        drop(tx); // source reports an error, loop exits and releases

        // Let the loop drain both frames and exit on its own before joining.
        while capturer.is_started() {
            thread::sleep(Duration::from_millis(1));
        }
        capturer.stop();

        let events = events.lock();
        assert_eq!(events.len(), 13); // 2 frames * 6 writes + release
        for event in &events[0..6] {
            assert_eq!(*event, Event::Write(vec![1; 6]));
        }
        for event in &events[6..12] {
            assert_eq!(*event, Event::Write(vec![2; 6]));
        }
        assert_eq!(events[12], Event::Release);
    }

    #[test]
    fn stop_joins_loop_and_releases_writer_last() {
        let backend = FakeBackend::endless();
        let events = Arc::clone(&backend.events);
        let mut capturer = VideoCapturer::new(backend, &test_config());

        capturer.start("v2").unwrap();
        thread::sleep(Duration::from_millis(20));
        capturer.stop();
        assert!(!capturer.is_started());

        let events = events.lock();
        // Writes happen in whole groups of six; exactly one release, last.
        let writes = events.iter().filter(|e| matches!(e, Event::Write(_))).count();
        assert!(writes > 0);
        assert_eq!(writes % 6, 0);
        let releases = events.iter().filter(|e| **e == Event::Release).count();
        assert_eq!(releases, 1);
        assert_eq!(*events.last().unwrap(), Event::Release);
    }

    #[test]
    fn start_while_started_is_a_no_op() {
        let backend = FakeBackend::endless();
        let writers_opened = Arc::clone(&backend.writers_opened);
        let mut capturer = VideoCapturer::new(backend, &test_config());

        capturer.start("v3").unwrap();
        capturer.start("v3-again").unwrap();
        assert_eq!(*writers_opened.lock(), 1);
        capturer.stop();
    }

    #[test]
    fn writer_open_failure_aborts_start() {
        let mut backend = FakeBackend::endless();
        backend.fail_writer = true;
        let mut capturer = VideoCapturer::new(backend, &test_config());

        let err = capturer.start("v4").unwrap_err();
        assert!(matches!(err, CaptureError::VideoBackend(_)));
        assert!(!capturer.is_started());
    }

    #[test]
    fn output_path_uses_backend_extension() {
        let backend = FakeBackend::endless();
        let capturer = VideoCapturer::new(backend, &test_config());
        assert_eq!(
            capturer.output_path("abc"),
            Path::new("output/video_abc.avi")
        );
    }
}
