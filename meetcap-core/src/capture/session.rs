use std::sync::Arc;

use crate::capture::chunk_queue::ChunkQueue;
use crate::capture::resolver::resolve_default_loopback_device;
use crate::models::config::SessionConfig;
use crate::models::device::StreamFormat;
use crate::models::error::CaptureError;
use crate::models::state::StreamState;
use crate::traits::audio_subsystem::{
    AudioSubsystem, ChunkCallback, InputStream, StreamControl, StreamRequest,
};

/// One recording session: two streams and their chunk buffers.
///
/// `session_id` keys the output file names (`spkr_<id>`, `mic_<id>`,
/// `audio_<id>`). Streams are closed and buffers drained on stop; buffers
/// outlive the streams so finalize can run after close.
pub struct CaptureSession {
    pub(crate) session_id: String,
    pub(crate) format: StreamFormat,
    pub(crate) speaker_stream: Option<Box<dyn InputStream>>,
    pub(crate) mic_stream: Option<Box<dyn InputStream>>,
    pub(crate) speaker_buffer: Arc<ChunkQueue>,
    pub(crate) mic_buffer: Arc<ChunkQueue>,
}

impl CaptureSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn speaker_buffer(&self) -> &ChunkQueue {
        &self.speaker_buffer
    }

    pub fn mic_buffer(&self) -> &ChunkQueue {
        &self.mic_buffer
    }
}

/// Opens and owns the two concurrent input streams of a session.
///
/// The speaker stream binds to the resolved loopback device; the mic stream
/// binds to the subsystem's default input. Both share the loopback device's
/// channel count and sample rate. Each stream's callback only enqueues the
/// raw chunk into that stream's buffer and returns
/// [`StreamControl::Continue`].
pub struct DualStreamCapturer<S: AudioSubsystem> {
    subsystem: S,
    chunk_frames: usize,
    session: Option<CaptureSession>,
}

impl<S: AudioSubsystem> DualStreamCapturer<S> {
    pub fn new(subsystem: S, config: &SessionConfig) -> Self {
        Self {
            subsystem,
            chunk_frames: config.chunk_frames,
            session: None,
        }
    }

    /// Start a new session, closing any prior session's streams first.
    ///
    /// Device resolution failure is logged and surfaced as
    /// [`CaptureError::DeviceRequired`]: without a resolved device no stream
    /// is opened at all.
    pub fn start(&mut self, session_id: &str) -> Result<(), CaptureError> {
        // No two sessions may hold device handles simultaneously.
        self.close();

        let device = match resolve_default_loopback_device(&self.subsystem) {
            Ok(device) => device,
            Err(e) => {
                log::error!("loopback device resolution failed: {e}");
                return Err(CaptureError::DeviceRequired);
            }
        };

        let format = StreamFormat::from_device(&device);
        let speaker_buffer = Arc::new(ChunkQueue::new());
        let mic_buffer = Arc::new(ChunkQueue::new());

        let queue = Arc::clone(&speaker_buffer);
        let speaker_callback: ChunkCallback = Arc::new(move |chunk: &[u8]| {
            queue.push(chunk.to_vec());
            StreamControl::Continue
        });
        let speaker_stream = self.subsystem.open_input_stream(
            &StreamRequest {
                device_index: Some(device.index),
                format,
                chunk_frames: self.chunk_frames,
            },
            speaker_callback,
        )?;

        let queue = Arc::clone(&mic_buffer);
        let mic_callback: ChunkCallback = Arc::new(move |chunk: &[u8]| {
            queue.push(chunk.to_vec());
            StreamControl::Continue
        });
        let mic_stream = match self.subsystem.open_input_stream(
            &StreamRequest {
                device_index: None,
                format,
                chunk_frames: self.chunk_frames,
            },
            mic_callback,
        ) {
            Ok(stream) => stream,
            Err(e) => {
                // Roll back so a half-open session never holds the device.
                let mut speaker_stream = speaker_stream;
                if let Err(close_err) = speaker_stream.close() {
                    log::warn!("speaker stream close failed during rollback: {close_err}");
                }
                return Err(e);
            }
        };

        self.session = Some(CaptureSession {
            session_id: session_id.to_string(),
            format,
            speaker_stream: Some(speaker_stream),
            mic_stream: Some(mic_stream),
            speaker_buffer,
            mic_buffer,
        });
        Ok(())
    }

    /// Pause both streams without discarding buffered data.
    pub fn stop_streams(&mut self) -> Result<(), CaptureError> {
        if let Some(session) = self.session.as_mut() {
            if let Some(stream) = session.speaker_stream.as_mut() {
                stream.pause()?;
            }
            if let Some(stream) = session.mic_stream.as_mut() {
                stream.pause()?;
            }
        }
        Ok(())
    }

    /// Resume both streams after [`Self::stop_streams`].
    pub fn start_streams(&mut self) -> Result<(), CaptureError> {
        if let Some(session) = self.session.as_mut() {
            if let Some(stream) = session.speaker_stream.as_mut() {
                stream.resume()?;
            }
            if let Some(stream) = session.mic_stream.as_mut() {
                stream.resume()?;
            }
        }
        Ok(())
    }

    /// Stop both streams and release their OS resources.
    ///
    /// Idempotent: closing an already-closed session is a no-op. The session
    /// itself (and its buffers) stays available for finalize.
    pub fn close(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Some(mut stream) = session.speaker_stream.take() {
                if let Err(e) = stream.close() {
                    log::warn!("speaker stream close failed: {e}");
                }
            }
            if let Some(mut stream) = session.mic_stream.take() {
                if let Err(e) = stream.close() {
                    log::warn!("mic stream close failed: {e}");
                }
            }
        }
    }

    /// Projected status, derived from the speaker stream handle.
    pub fn status(&self) -> StreamState {
        match self
            .session
            .as_ref()
            .and_then(|session| session.speaker_stream.as_ref())
        {
            None => StreamState::Closed,
            Some(stream) if stream.is_stopped() => StreamState::Stopped,
            Some(_) => StreamState::Running,
        }
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Hand the session (with its buffers) to the caller for finalize.
    pub fn take_session(&mut self) -> Option<CaptureSession> {
        self.close();
        self.session.take()
    }
}
