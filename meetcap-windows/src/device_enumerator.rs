//! Windows audio device enumeration via the MMDevice API.
//!
//! Wraps `IMMDeviceEnumerator` to build the indexed device table the core
//! resolver works against: capture endpoints, render endpoints, and one
//! loopback pseudo-device per render endpoint. Loopback entries are named
//! `<render name> [Loopback]`, so the resolver's substring match pairs them
//! with the default output device.

use windows::core::*;
use windows::Win32::Devices::FunctionDiscovery::*;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::StructuredStorage::{PropVariantClear, PROPVARIANT};
use windows::Win32::System::Com::*;
use windows::Win32::System::Variant::*;

use meetcap_core::models::device::AudioDevice;
use meetcap_core::models::error::CaptureError;

/// What an entry in the device table points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndpointRole {
    Capture,
    Render,
    Loopback,
}

/// One row of the device table: the public device plus the MMDevice id the
/// stream layer needs to open it.
#[derive(Debug, Clone)]
pub(crate) struct EndpointEntry {
    pub device: AudioDevice,
    pub mm_id: String,
    pub role: EndpointRole,
}

/// Audio device enumerator using the Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// Create a new device enumerator.
    ///
    /// Requires COM to be initialized on the calling thread.
    pub fn new() -> Result<Self, CaptureError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(|e| {
                    CaptureError::SubsystemUnavailable(format!("failed to create enumerator: {e}"))
                })?;
            Ok(Self { enumerator })
        }
    }

    /// The default render endpoint, as listed in the device table.
    pub fn default_output_device(&self) -> Result<AudioDevice, CaptureError> {
        let default_id = self.default_endpoint_id(eRender)?;
        self.table()?
            .into_iter()
            .find(|entry| entry.role == EndpointRole::Render && entry.mm_id == default_id)
            .map(|entry| entry.device)
            .ok_or_else(|| {
                CaptureError::SubsystemUnavailable("default render endpoint not listed".into())
            })
    }

    /// All loopback pseudo-devices, in enumeration order.
    pub fn loopback_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        Ok(self
            .table()?
            .into_iter()
            .filter(|entry| entry.role == EndpointRole::Loopback)
            .map(|entry| entry.device)
            .collect())
    }

    /// Look up a device-table index for stream opening.
    pub(crate) fn lookup(&self, index: u32) -> Result<EndpointEntry, CaptureError> {
        self.table()?
            .into_iter()
            .find(|entry| entry.device.index == index)
            .ok_or_else(|| CaptureError::StreamFailed(format!("no device at index {index}")))
    }

    /// Build the device table: capture endpoints, then render endpoints,
    /// then loopback twins of the render endpoints.
    pub(crate) fn table(&self) -> Result<Vec<EndpointEntry>, CaptureError> {
        let mut entries = Vec::new();

        for (mm_id, name, format) in self.list_endpoints(eCapture)? {
            entries.push(EndpointEntry {
                device: AudioDevice {
                    index: entries.len() as u32,
                    name,
                    max_input_channels: format.channels,
                    default_sample_rate: format.sample_rate,
                    is_loopback: false,
                },
                mm_id,
                role: EndpointRole::Capture,
            });
        }

        let render = self.list_endpoints(eRender)?;
        for (mm_id, name, format) in &render {
            entries.push(EndpointEntry {
                device: AudioDevice {
                    index: entries.len() as u32,
                    name: name.clone(),
                    max_input_channels: 0,
                    default_sample_rate: format.sample_rate,
                    is_loopback: false,
                },
                mm_id: mm_id.clone(),
                role: EndpointRole::Render,
            });
        }
        for (mm_id, name, format) in render {
            entries.push(EndpointEntry {
                device: AudioDevice {
                    index: entries.len() as u32,
                    name: format!("{name} [Loopback]"),
                    max_input_channels: format.channels,
                    default_sample_rate: format.sample_rate,
                    is_loopback: true,
                },
                mm_id,
                role: EndpointRole::Loopback,
            });
        }

        Ok(entries)
    }

    fn default_endpoint_id(&self, data_flow: EDataFlow) -> Result<String, CaptureError> {
        unsafe {
            let device = self
                .enumerator
                .GetDefaultAudioEndpoint(data_flow, eConsole)
                .map_err(|e| {
                    CaptureError::SubsystemUnavailable(format!("no default endpoint: {e}"))
                })?;
            let id = device.GetId().map_err(|e| {
                CaptureError::SubsystemUnavailable(format!("GetId failed: {e}"))
            })?;
            id.to_string().map_err(|e| {
                CaptureError::SubsystemUnavailable(format!("device id not valid UTF-16: {e}"))
            })
        }
    }

    fn list_endpoints(
        &self,
        data_flow: EDataFlow,
    ) -> Result<Vec<(String, String, EndpointFormat)>, CaptureError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(data_flow, DEVICE_STATE_ACTIVE)
                .map_err(|e| {
                    CaptureError::SubsystemUnavailable(format!("EnumAudioEndpoints failed: {e}"))
                })?;

            let count = collection.GetCount().map_err(|e| {
                CaptureError::SubsystemUnavailable(format!("GetCount failed: {e}"))
            })?;

            let mut endpoints = Vec::new();
            for i in 0..count {
                let device = match collection.Item(i) {
                    Ok(d) => d,
                    Err(_) => continue,
                };
                let id = match device.GetId().ok().and_then(|id| id.to_string().ok()) {
                    Some(id) => id,
                    None => continue,
                };
                let name =
                    device_friendly_name(&device).unwrap_or_else(|| format!("Device {i}"));
                let format = match endpoint_format(&device) {
                    Some(f) => f,
                    None => continue,
                };
                endpoints.push((id, name, format));
            }
            Ok(endpoints)
        }
    }
}

/// Mix-format fields needed for the device table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EndpointFormat {
    pub channels: u16,
    pub sample_rate: f64,
}

/// Read an endpoint's shared-mode mix format.
fn endpoint_format(device: &IMMDevice) -> Option<EndpointFormat> {
    unsafe {
        let audio_client: IAudioClient = device.Activate(CLSCTX_ALL, None).ok()?;
        let mix_format_ptr = audio_client.GetMixFormat().ok()?;
        let mix_format = &*mix_format_ptr;
        let format = EndpointFormat {
            channels: mix_format.nChannels,
            sample_rate: mix_format.nSamplesPerSec as f64,
        };
        CoTaskMemFree(Some(mix_format_ptr as *const _ as *const _));
        Some(format)
    }
}

/// Read the PKEY_Device_FriendlyName property from a device.
fn device_friendly_name(device: &IMMDevice) -> Option<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM_READ).ok()?;

        let mut prop_variant = std::mem::zeroed::<PROPVARIANT>();
        store
            .GetValue(&PKEY_Device_FriendlyName, &mut prop_variant)
            .ok()?;

        let name = if prop_variant.Anonymous.Anonymous.vt == VT_LPWSTR {
            let pwsz = prop_variant.Anonymous.Anonymous.Anonymous.pwszVal;
            if !pwsz.is_null() {
                let len = (0..).take_while(|&i| *pwsz.offset(i) != 0).count();
                Some(String::from_utf16_lossy(std::slice::from_raw_parts(
                    pwsz, len,
                )))
            } else {
                None
            }
        } else {
            None
        };

        PropVariantClear(&mut prop_variant).ok();
        name
    }
}
