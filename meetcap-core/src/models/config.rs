use std::path::PathBuf;

/// Configuration for recording sessions.
///
/// Replaces the ambient module-level defaults of earlier revisions with an
/// explicit struct passed into each capture/finalize call. Device parameters
/// (channel count, sample rate) are not configured here — they are resolved
/// per session from the loopback device.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Directory where interim and final recording files are written.
    pub output_directory: PathBuf,

    /// Frames delivered per stream callback invocation. Small values bound
    /// per-callback latency (default: 512).
    pub chunk_frames: usize,

    /// Nominal video frame rate written to the container (default: 60.0).
    pub video_fps: f64,

    /// Extra copies of each captured screen frame appended to the video
    /// writer, approximating the nominal rate without timestamp pacing
    /// (default: 5, i.e. six writes per screenshot).
    pub frame_duplication: usize,

    /// Write a `*.metadata.json` sidecar next to the finalized recording.
    pub write_metadata: bool,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_frames == 0 {
            return Err("chunk_frames must be positive".into());
        }
        if self.video_fps <= 0.0 {
            return Err("video_fps must be positive".into());
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("output"),
            chunk_frames: 512,
            video_fps: 60.0,
            frame_duplication: 5,
            write_metadata: true,
        }
    }
}
