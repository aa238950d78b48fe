//! # meetcap-core
//!
//! Platform-agnostic meeting capture core library.
//!
//! Provides dual-stream audio buffering, loopback device resolution, WAV
//! I/O, overlay mixing, session finalization, and the screen recording loop.
//! Platform-specific backends (Windows WASAPI) implement the
//! `AudioSubsystem` / `VideoBackend` traits and plug into the generic
//! `DualStreamCapturer`, `VideoCapturer`, and `Recorder`.
//!
//! ## Architecture
//!
//! ```text
//! meetcap-core (this crate)
//! ├── traits/       ← AudioSubsystem, InputStream, VideoBackend, ScreenSource, VideoSink
//! ├── models/       ← CaptureError, StreamState, SessionConfig, AudioDevice
//! ├── capture/      ← ChunkQueue, device resolver, DualStreamCapturer
//! ├── processing/   ← WAV header generation/parsing, 24-bit overlay mixing
//! ├── storage/      ← session finalization, metadata sidecar
//! ├── video/        ← VideoFrame, VideoCapturer loop
//! └── recorder      ← Recorder facade (audio + video lifecycles)
//! ```
//!
//! ## Data flow
//!
//! ```text
//! [Loopback Stream] → [spkr ChunkQueue] ─┐
//!                                         ├→ [interim WAVs] → [overlay] → audio_<id>.wav
//! [Mic Stream]      → [mic ChunkQueue]  ─┘
//! ```

pub mod capture;
pub mod models;
pub mod processing;
pub mod recorder;
pub mod storage;
pub mod traits;
pub mod video;

// Re-export key types at crate root for convenience.
pub use capture::chunk_queue::ChunkQueue;
pub use capture::resolver::resolve_default_loopback_device;
pub use capture::session::{CaptureSession, DualStreamCapturer};
pub use models::config::SessionConfig;
pub use models::device::{AudioDevice, StreamFormat};
pub use models::error::CaptureError;
pub use models::state::StreamState;
pub use recorder::Recorder;
pub use storage::metadata::RecordingMetadata;
pub use storage::session_writer::finalize;
pub use traits::audio_subsystem::{
    AudioSubsystem, ChunkCallback, InputStream, StreamControl, StreamRequest,
};
pub use traits::video_backend::{ScreenSource, VideoBackend, VideoSink};
pub use video::capturer::VideoCapturer;
pub use video::frame::{PixelFormat, VideoFrame};
