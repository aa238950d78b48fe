use std::sync::Arc;

use crate::models::device::{AudioDevice, StreamFormat};
use crate::models::error::CaptureError;

/// Returned by a chunk callback to tell the stream whether to keep capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    Continue,
    Complete,
}

/// Callback invoked when a chunk of captured frames is available.
///
/// `chunk` is raw 24-bit little-endian PCM, interleaved, exactly
/// `chunk_frames` frames long. Fires on a subsystem-managed thread — the
/// callback must not block; its only duty is to enqueue the chunk.
pub type ChunkCallback = Arc<dyn Fn(&[u8]) -> StreamControl + Send + Sync + 'static>;

/// Where and how an input stream should bind.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    /// Device table index to bind, or `None` for the subsystem's default
    /// input (microphone).
    pub device_index: Option<u32>,
    pub format: StreamFormat,
    /// Frames delivered per callback invocation.
    pub chunk_frames: usize,
}

/// An open capture stream.
///
/// Implemented by `WasapiInputStream` (Windows) and by test fakes.
pub trait InputStream: Send {
    /// Pause delivery without discarding already-buffered data.
    fn pause(&mut self) -> Result<(), CaptureError>;

    /// Resume delivery after a pause.
    fn resume(&mut self) -> Result<(), CaptureError>;

    fn is_stopped(&self) -> bool;

    /// Stop capturing and release OS resources. Idempotent.
    fn close(&mut self) -> Result<(), CaptureError>;
}

/// Interface to the host audio subsystem.
///
/// Covers device enumeration and stream creation. Implemented by
/// `WasapiSubsystem` in the Windows backend crate; the core crate only ever
/// talks to this trait.
pub trait AudioSubsystem: Send + Sync {
    /// Whether the subsystem is present and exposes device enumeration.
    fn is_available(&self) -> bool;

    /// The system default output (render) device.
    fn default_output_device(&self) -> Result<AudioDevice, CaptureError>;

    /// All loopback-capable input devices, in enumeration order.
    fn loopback_devices(&self) -> Result<Vec<AudioDevice>, CaptureError>;

    /// Open an input stream delivering chunks via `callback` on a
    /// subsystem-managed thread.
    fn open_input_stream(
        &self,
        request: &StreamRequest,
        callback: ChunkCallback,
    ) -> Result<Box<dyn InputStream>, CaptureError>;
}
