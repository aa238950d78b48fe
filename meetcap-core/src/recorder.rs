use std::fs;
use std::path::PathBuf;

use crate::capture::session::DualStreamCapturer;
use crate::models::config::SessionConfig;
use crate::models::error::CaptureError;
use crate::models::state::StreamState;
use crate::storage::session_writer;
use crate::traits::audio_subsystem::AudioSubsystem;
use crate::traits::video_backend::VideoBackend;
use crate::video::capturer::VideoCapturer;

/// Format of the timestamp-derived default session identifier.
const SESSION_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Coordinates the audio and video capture lifecycles for a UI layer.
///
/// Audio and video run independently and may be started or stopped in any
/// order. Only [`CaptureError`] kinds ever surface from here — raw subsystem
/// failures are converted at the capture layer.
pub struct Recorder<S: AudioSubsystem, B: VideoBackend> {
    config: SessionConfig,
    audio: DualStreamCapturer<S>,
    video: VideoCapturer<B>,
}

impl<S: AudioSubsystem, B: VideoBackend> Recorder<S, B> {
    pub fn new(
        subsystem: S,
        video_backend: B,
        config: SessionConfig,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfiguration)?;
        fs::create_dir_all(&config.output_directory).map_err(|e| {
            CaptureError::StorageError(format!("failed to create output directory: {e}"))
        })?;

        Ok(Self {
            audio: DualStreamCapturer::new(subsystem, &config),
            video: VideoCapturer::new(video_backend, &config),
            config,
        })
    }

    /// A fresh session identifier derived from the local wall clock.
    pub fn timestamp_session_id() -> String {
        chrono::Local::now().format(SESSION_ID_FORMAT).to_string()
    }

    pub fn start_audio(&mut self, session_id: &str) -> Result<(), CaptureError> {
        self.audio.start(session_id)?;
        log::info!("audio recording started for session {session_id}");
        Ok(())
    }

    /// Stop and close the audio streams, then finalize the session.
    ///
    /// Returns the combined output path for display or downstream use.
    pub fn stop_audio(&mut self) -> Result<PathBuf, CaptureError> {
        let session = self
            .audio
            .take_session()
            .ok_or(CaptureError::NoAudioCaptured)?;
        let path = session_writer::finalize(&session, &self.config)?;
        log::info!("audio written to {}", path.display());
        Ok(path)
    }

    pub fn audio_status(&self) -> StreamState {
        self.audio.status()
    }

    pub fn start_video(&mut self, session_id: &str) -> Result<(), CaptureError> {
        self.video.start(session_id)
    }

    pub fn stop_video(&mut self) {
        self.video.stop();
        log::info!("video recording stopped");
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::models::device::AudioDevice;
    use crate::processing::overlay_mixer::encode_i24;
    use crate::traits::audio_subsystem::{ChunkCallback, InputStream, StreamRequest};
    use crate::traits::video_backend::{ScreenSource, VideoSink};
    use crate::video::frame::{PixelFormat, VideoFrame};

    struct NullStream;

    impl InputStream for NullStream {
        fn pause(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        fn resume(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        fn is_stopped(&self) -> bool {
            false
        }

        fn close(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    struct FakeSubsystem {
        callbacks: Arc<Mutex<Vec<ChunkCallback>>>,
    }

    impl AudioSubsystem for FakeSubsystem {
        fn is_available(&self) -> bool {
            true
        }

        fn default_output_device(&self) -> Result<AudioDevice, CaptureError> {
            Ok(AudioDevice {
                index: 0,
                name: "Speakers".into(),
                max_input_channels: 0,
                default_sample_rate: 44100.0,
                is_loopback: false,
            })
        }

        fn loopback_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
            Ok(vec![AudioDevice {
                index: 1,
                name: "Speakers [Loopback]".into(),
                max_input_channels: 1,
                default_sample_rate: 44100.0,
                is_loopback: true,
            }])
        }

        fn open_input_stream(
            &self,
            _request: &StreamRequest,
            callback: ChunkCallback,
        ) -> Result<Box<dyn InputStream>, CaptureError> {
            self.callbacks.lock().push(callback);
            Ok(Box::new(NullStream))
        }
    }

    struct StaticSource;

    impl ScreenSource for StaticSource {
        fn grab(&mut self) -> Result<VideoFrame, CaptureError> {
            Ok(VideoFrame {
                width: 1,
                height: 1,
                format: PixelFormat::Rgb,
                data: vec![0, 0, 0],
            })
        }
    }

    struct NullSink;

    impl VideoSink for NullSink {
        fn write_frame(&mut self, _frame: &VideoFrame) -> Result<(), CaptureError> {
            Ok(())
        }

        fn release(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    struct FakeVideoBackend;

    impl VideoBackend for FakeVideoBackend {
        fn screen_size(&self) -> Result<(u32, u32), CaptureError> {
            Ok((1, 1))
        }

        fn open_source(&self) -> Result<Box<dyn ScreenSource>, CaptureError> {
            Ok(Box::new(StaticSource))
        }

        fn open_writer(
            &self,
            _path: &Path,
            _size: (u32, u32),
            _fps: f64,
        ) -> Result<Box<dyn VideoSink>, CaptureError> {
            Ok(Box::new(NullSink))
        }

        fn container_extension(&self) -> &str {
            "avi"
        }
    }

    fn test_config(name: &str) -> SessionConfig {
        SessionConfig {
            output_directory: std::env::temp_dir().join(format!("meetcap_recorder_test_{name}")),
            write_metadata: false,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn start_stop_audio_produces_combined_file() {
        let config = test_config("roundtrip");
        let callbacks = Arc::new(Mutex::new(Vec::new()));
        let subsystem = FakeSubsystem {
            callbacks: Arc::clone(&callbacks),
        };
        let mut recorder = Recorder::new(subsystem, FakeVideoBackend, config.clone()).unwrap();

        recorder.start_audio("m1").unwrap();
        assert_eq!(recorder.audio_status(), StreamState::Running);

        // Feed the mic stream (second one opened) a couple of chunks.
        (callbacks.lock()[1])(&encode_i24(&[1, 2]));
        (callbacks.lock()[1])(&encode_i24(&[3]));

        let path = recorder.stop_audio().unwrap();
        assert_eq!(path, config.output_directory.join("audio_m1.wav"));
        assert!(path.exists());
        assert_eq!(recorder.audio_status(), StreamState::Closed);

        fs::remove_dir_all(&config.output_directory).ok();
    }

    #[test]
    fn stop_audio_without_start_reports_no_audio() {
        let config = test_config("no_start");
        let subsystem = FakeSubsystem {
            callbacks: Arc::new(Mutex::new(Vec::new())),
        };
        let mut recorder = Recorder::new(subsystem, FakeVideoBackend, config.clone()).unwrap();

        assert_eq!(
            recorder.stop_audio().unwrap_err(),
            CaptureError::NoAudioCaptured
        );
        fs::remove_dir_all(&config.output_directory).ok();
    }

    #[test]
    fn video_lifecycle_is_independent_of_audio() {
        let config = test_config("video");
        let subsystem = FakeSubsystem {
            callbacks: Arc::new(Mutex::new(Vec::new())),
        };
        let mut recorder = Recorder::new(subsystem, FakeVideoBackend, config.clone()).unwrap();

        recorder.start_video("m2").unwrap();
        recorder.stop_video();
        assert_eq!(recorder.audio_status(), StreamState::Closed);

        fs::remove_dir_all(&config.output_directory).ok();
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut config = test_config("invalid");
        config.chunk_frames = 0;
        let subsystem = FakeSubsystem {
            callbacks: Arc::new(Mutex::new(Vec::new())),
        };

        let err = match Recorder::new(subsystem, FakeVideoBackend, config) {
            Ok(_) => panic!("expected configuration to be rejected"),
            Err(e) => e,
        };
        assert!(matches!(err, CaptureError::InvalidConfiguration(_)));
    }

    #[test]
    fn timestamp_session_id_shape() {
        let id = Recorder::<FakeSubsystem, FakeVideoBackend>::timestamp_session_id();
        // %Y%m%d-%H%M%S
        assert_eq!(id.len(), 15);
        assert_eq!(id.as_bytes()[8], b'-');
    }
}
