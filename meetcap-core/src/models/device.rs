/// An audio endpoint as reported by the host subsystem.
///
/// Resolved once per recording session and immutable for that session.
/// Loopback devices are input endpoints that capture what a render endpoint
/// is playing ("what you hear" recording).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDevice {
    /// Position in the subsystem's device table.
    pub index: u32,
    pub name: String,
    pub max_input_channels: u16,
    pub default_sample_rate: f64,
    pub is_loopback: bool,
}

/// Stream parameters shared by both capture streams of a session.
///
/// Derived from the resolved loopback device and stamped into the WAV
/// headers at finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

impl StreamFormat {
    pub fn from_device(device: &AudioDevice) -> Self {
        Self {
            channels: device.max_input_channels,
            sample_rate: device.default_sample_rate as u32,
        }
    }
}
