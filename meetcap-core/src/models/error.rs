use thiserror::Error;

/// Errors that can occur during a recording session.
///
/// Capture-layer failures are caught close to their source, logged, and
/// converted into one of these kinds; callers never see raw subsystem errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The host audio subsystem does not expose loopback device enumeration.
    #[error("audio subsystem unavailable: {0}")]
    SubsystemUnavailable(String),

    /// Enumeration succeeded but no loopback device shadows the default output.
    #[error("no loopback device matches default output `{0}`")]
    NoMatchingDevice(String),

    /// Stream open was attempted without a resolved capture device.
    #[error("no capture device resolved; refusing to open streams")]
    DeviceRequired,

    /// Finalize was invoked with both session buffers empty.
    #[error("no audio captured")]
    NoAudioCaptured,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("video backend error: {0}")]
    VideoBackend(String),

    #[error("storage error: {0}")]
    StorageError(String),
}
