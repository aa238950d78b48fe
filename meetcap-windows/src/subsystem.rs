//! `AudioSubsystem` implementation backed by WASAPI.

use meetcap_core::models::device::AudioDevice;
use meetcap_core::models::error::CaptureError;
use meetcap_core::traits::audio_subsystem::{
    AudioSubsystem, ChunkCallback, InputStream, StreamRequest,
};

use crate::com::ComSession;
use crate::device_enumerator::{DeviceEnumerator, EndpointRole};
use crate::wasapi_stream::{StreamEndpoint, WasapiInputStream};

/// The Windows audio subsystem.
///
/// Stateless: every call initializes COM on the calling thread and builds a
/// fresh device table, so hot-plugged endpoints show up without a restart.
#[derive(Debug, Default)]
pub struct WasapiSubsystem;

impl WasapiSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSubsystem for WasapiSubsystem {
    fn is_available(&self) -> bool {
        let Ok(_com) = ComSession::init() else {
            return false;
        };
        DeviceEnumerator::new().is_ok()
    }

    fn default_output_device(&self) -> Result<AudioDevice, CaptureError> {
        let _com = ComSession::init()?;
        DeviceEnumerator::new()?.default_output_device()
    }

    fn loopback_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        let _com = ComSession::init()?;
        DeviceEnumerator::new()?.loopback_devices()
    }

    fn open_input_stream(
        &self,
        request: &StreamRequest,
        callback: ChunkCallback,
    ) -> Result<Box<dyn InputStream>, CaptureError> {
        let endpoint = match request.device_index {
            None => StreamEndpoint::DefaultCapture,
            Some(index) => {
                let _com = ComSession::init()?;
                let entry = DeviceEnumerator::new()?.lookup(index)?;
                match entry.role {
                    EndpointRole::Loopback => StreamEndpoint::RenderLoopback(entry.mm_id),
                    EndpointRole::Capture => StreamEndpoint::Capture(entry.mm_id),
                    EndpointRole::Render => {
                        return Err(CaptureError::StreamFailed(format!(
                            "device {index} is a render endpoint and cannot capture"
                        )))
                    }
                }
            }
        };

        let stream = WasapiInputStream::open(endpoint, request, callback)?;
        Ok(Box::new(stream))
    }
}
