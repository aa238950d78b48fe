use std::path::Path;

use crate::models::error::CaptureError;
use crate::video::frame::VideoFrame;

/// A source of screen snapshots.
pub trait ScreenSource: Send {
    /// Grab one snapshot of the screen region. Blocks until a frame is
    /// available; an error ends the capture loop.
    fn grab(&mut self) -> Result<VideoFrame, CaptureError>;
}

/// A video container writer.
pub trait VideoSink: Send {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), CaptureError>;

    /// Flush buffered frames and release the underlying writer.
    fn release(&mut self) -> Result<(), CaptureError>;
}

/// Interface to the host screen-capture API and video container codec.
///
/// Both are external collaborators; the core crate only drives the capture
/// loop. Writer-open failures (missing backend, missing codec) abort the
/// capture start.
pub trait VideoBackend: Send + Sync {
    /// Full capture region size in pixels.
    fn screen_size(&self) -> Result<(u32, u32), CaptureError>;

    fn open_source(&self) -> Result<Box<dyn ScreenSource>, CaptureError>;

    fn open_writer(
        &self,
        path: &Path,
        size: (u32, u32),
        fps: f64,
    ) -> Result<Box<dyn VideoSink>, CaptureError>;

    /// Container extension used for output naming (e.g. "avi").
    fn container_extension(&self) -> &str;
}
