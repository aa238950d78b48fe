//! WASAPI shared-mode input streams.
//!
//! One stream type covers both endpoints the session opens: a capture
//! endpoint (microphone) and a render endpoint with
//! `AUDCLNT_STREAMFLAGS_LOOPBACK` (speaker loopback, "what you hear").
//! Each stream runs a dedicated capture thread that polls the endpoint,
//! converts the delivered Float32 buffers to the session format, and hands
//! fixed-size 24-bit chunks to the registered callback. DRM-protected audio
//! arrives silenced in loopback mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use windows::core::PCWSTR;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Threading::*;

use meetcap_core::models::device::StreamFormat;
use meetcap_core::models::error::CaptureError;
use meetcap_core::traits::audio_subsystem::{
    ChunkCallback, InputStream, StreamControl, StreamRequest,
};

use crate::com::ComSession;
use crate::sample_convert::{convert_to_int24_pcm, remap_channels, resample_linear, ChunkFramer};

/// Which endpoint a stream binds and how.
#[derive(Debug, Clone)]
pub(crate) enum StreamEndpoint {
    /// The system default capture endpoint (microphone).
    DefaultCapture,
    /// A specific capture endpoint by MMDevice id.
    Capture(String),
    /// A render endpoint opened with the loopback flag.
    RenderLoopback(String),
}

/// A WASAPI input stream delivering 24-bit chunks on its own thread.
pub struct WasapiInputStream {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl WasapiInputStream {
    pub(crate) fn open(
        endpoint: StreamEndpoint,
        request: &StreamRequest,
        callback: ChunkCallback,
    ) -> Result<Self, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let paused = Arc::new(AtomicBool::new(false));

        let loop_running = Arc::clone(&running);
        let loop_paused = Arc::clone(&paused);
        let format = request.format;
        let chunk_frames = request.chunk_frames;

        let handle = thread::Builder::new()
            .name("wasapi-capture".into())
            .spawn(move || {
                if let Err(e) = capture_loop(
                    Arc::clone(&loop_running),
                    loop_paused,
                    endpoint,
                    format,
                    chunk_frames,
                    callback,
                ) {
                    log::error!("WASAPI capture error: {e}");
                }
                loop_running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                CaptureError::StreamFailed(format!("failed to spawn capture thread: {e}"))
            })?;

        Ok(Self {
            running,
            paused,
            capture_handle: Mutex::new(Some(handle)),
        })
    }
}

impl InputStream for WasapiInputStream {
    fn pause(&mut self) -> Result<(), CaptureError> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_stopped(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for WasapiInputStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Main capture loop running on a dedicated thread.
///
/// Sequence:
/// 1. CoInitializeEx (MTA)
/// 2. Get the endpoint (default capture, by id, or render for loopback)
/// 3. Activate IAudioClient, Initialize in shared mode
/// 4. Get IAudioCaptureClient, register with MMCSS
/// 5. Start, poll for buffers, convert, deliver fixed-size chunks
///
/// Pause transitions map to `IAudioClient::Stop`/`Start` so paused spans
/// capture nothing instead of piling into the endpoint buffer.
fn capture_loop(
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    endpoint: StreamEndpoint,
    format: StreamFormat,
    chunk_frames: usize,
    callback: ChunkCallback,
) -> Result<(), CaptureError> {
    unsafe {
        let _com = ComSession::init()?;

        let enumerator: IMMDeviceEnumerator =
            windows::Win32::System::Com::CoCreateInstance(
                &MMDeviceEnumerator,
                None,
                windows::Win32::System::Com::CLSCTX_ALL,
            )
            .map_err(|e| {
                CaptureError::SubsystemUnavailable(format!("failed to create enumerator: {e}"))
            })?;

        let (device, loopback) = match &endpoint {
            StreamEndpoint::DefaultCapture => (
                enumerator
                    .GetDefaultAudioEndpoint(eCapture, eConsole)
                    .map_err(|e| {
                        CaptureError::StreamFailed(format!("no default capture endpoint: {e}"))
                    })?,
                false,
            ),
            StreamEndpoint::Capture(id) => (get_device_by_id(&enumerator, id)?, false),
            StreamEndpoint::RenderLoopback(id) => (get_device_by_id(&enumerator, id)?, true),
        };

        let audio_client: IAudioClient = device
            .Activate(windows::Win32::System::Com::CLSCTX_ALL, None)
            .map_err(|e| CaptureError::StreamFailed(format!("Activate failed: {e}")))?;

        let mix_format_ptr = audio_client
            .GetMixFormat()
            .map_err(|e| CaptureError::StreamFailed(format!("GetMixFormat failed: {e}")))?;

        let mix_format = &*mix_format_ptr;
        let native_rate = mix_format.nSamplesPerSec as f64;
        let native_channels = mix_format.nChannels;

        let stream_flags = if loopback {
            AUDCLNT_STREAMFLAGS_LOOPBACK | AUDCLNT_STREAMFLAGS_NOPERSIST
        } else {
            AUDCLNT_STREAMFLAGS_NOPERSIST
        };

        // Buffer duration: 100ms in 100-nanosecond units
        let buffer_duration = 1_000_000;

        audio_client
            .Initialize(
                AUDCLNT_SHAREMODE_SHARED,
                stream_flags,
                buffer_duration,
                0,
                mix_format,
                None,
            )
            .map_err(|e| {
                CaptureError::StreamFailed(format!("IAudioClient::Initialize failed: {e}"))
            })?;

        let capture_client: IAudioCaptureClient = audio_client
            .GetService()
            .map_err(|e| CaptureError::StreamFailed(format!("GetService failed: {e}")))?;

        // MMCSS registration for real-time priority
        let mut task_index: u32 = 0;
        let task_name: Vec<u16> = "Pro Audio\0".encode_utf16().collect();
        let _mmcss_handle = AvSetMmThreadCharacteristicsW(PCWSTR(task_name.as_ptr()), &mut task_index);

        audio_client
            .Start()
            .map_err(|e| CaptureError::StreamFailed(format!("IAudioClient::Start failed: {e}")))?;

        let mut framer = ChunkFramer::new(chunk_frames, format.channels);
        let mut was_paused = false;

        // Capture loop — poll every 10ms
        'capture: while running.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(10));

            let now_paused = paused.load(Ordering::SeqCst);
            if now_paused != was_paused {
                if now_paused {
                    let _ = audio_client.Stop();
                } else {
                    let _ = audio_client.Start();
                }
                was_paused = now_paused;
            }
            if now_paused {
                continue;
            }

            let mut packet_length = capture_client
                .GetNextPacketSize()
                .map_err(|e| CaptureError::StreamFailed(format!("GetNextPacketSize failed: {e}")))?;

            while packet_length > 0 {
                let mut buffer_ptr: *mut u8 = std::ptr::null_mut();
                let mut num_frames: u32 = 0;
                let mut flags: u32 = 0;

                capture_client
                    .GetBuffer(&mut buffer_ptr, &mut num_frames, &mut flags, None, None)
                    .map_err(|e| CaptureError::StreamFailed(format!("GetBuffer failed: {e}")))?;

                if num_frames > 0 && !buffer_ptr.is_null() {
                    let total_samples = num_frames as usize * native_channels as usize;

                    // WASAPI delivers Float32 in shared mode
                    let float_ptr = buffer_ptr as *const f32;
                    let native = std::slice::from_raw_parts(float_ptr, total_samples);

                    let samples: Vec<f32> =
                        if flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 {
                            vec![0.0f32; total_samples]
                        } else {
                            native.to_vec()
                        };

                    let remapped = remap_channels(&samples, native_channels, format.channels);
                    let resampled = resample_linear(
                        &remapped,
                        format.channels,
                        native_rate,
                        format.sample_rate as f64,
                    );
                    let pcm = convert_to_int24_pcm(&resampled);

                    for chunk in framer.push(&pcm) {
                        if callback(&chunk) == StreamControl::Complete {
                            running.store(false, Ordering::SeqCst);
                            capture_client.ReleaseBuffer(num_frames).ok();
                            break 'capture;
                        }
                    }
                }

                capture_client
                    .ReleaseBuffer(num_frames)
                    .map_err(|e| CaptureError::StreamFailed(format!("ReleaseBuffer failed: {e}")))?;

                packet_length = capture_client.GetNextPacketSize().map_err(|e| {
                    CaptureError::StreamFailed(format!("GetNextPacketSize failed: {e}"))
                })?;
            }
        }

        let _ = audio_client.Stop();
        windows::Win32::System::Com::CoTaskMemFree(Some(mix_format_ptr as *const _ as *const _));
    }

    Ok(())
}

fn get_device_by_id(
    enumerator: &IMMDeviceEnumerator,
    id: &str,
) -> Result<IMMDevice, CaptureError> {
    unsafe {
        let wide_id: Vec<u16> = id.encode_utf16().chain(std::iter::once(0)).collect();
        enumerator
            .GetDevice(PCWSTR(wide_id.as_ptr()))
            .map_err(|e| CaptureError::StreamFailed(format!("device {id} unavailable: {e}")))
    }
}
