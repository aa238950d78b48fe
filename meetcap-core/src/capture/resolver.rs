use crate::models::device::AudioDevice;
use crate::models::error::CaptureError;
use crate::traits::audio_subsystem::AudioSubsystem;

/// Find the loopback-capable input device that shadows the system default
/// output device.
///
/// Queries the default output endpoint; if it is not itself a loopback
/// device, scans the loopback devices for the first whose name contains the
/// default output's name as a substring. First match in enumeration order
/// wins — there is no scoring.
///
/// Never opens streams; the only side effect is querying the subsystem.
pub fn resolve_default_loopback_device(
    subsystem: &dyn AudioSubsystem,
) -> Result<AudioDevice, CaptureError> {
    if !subsystem.is_available() {
        return Err(CaptureError::SubsystemUnavailable(
            "host subsystem does not expose device enumeration".into(),
        ));
    }

    let default_output = subsystem.default_output_device()?;
    if default_output.is_loopback {
        return Ok(default_output);
    }

    for loopback in subsystem.loopback_devices()? {
        if loopback.name.contains(&default_output.name) {
            return Ok(loopback);
        }
    }

    Err(CaptureError::NoMatchingDevice(default_output.name))
}
