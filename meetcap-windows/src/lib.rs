//! # meetcap-windows
//!
//! Windows WASAPI backend for meetcap.
//!
//! Provides:
//! - `WasapiSubsystem` — `AudioSubsystem` implementation (device table with
//!   loopback pseudo-devices, stream opening)
//! - `WasapiInputStream` — shared-mode capture for microphone and
//!   speaker-loopback endpoints
//! - `DeviceEnumerator` — audio device enumeration via the MMDevice API
//! - `sample_convert` — Float32 → 24-bit chunk conversion helpers
//!
//! ## Platform Requirements
//! - Windows 10 1703+ (build 15063)
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! ## Usage
//! ```ignore
//! use meetcap_core::{Recorder, SessionConfig};
//! use meetcap_windows::WasapiSubsystem;
//!
//! let mut recorder = Recorder::new(
//!     WasapiSubsystem::new(),
//!     my_video_backend,
//!     SessionConfig::default(),
//! )?;
//! let id = Recorder::<WasapiSubsystem, _>::timestamp_session_id();
//! recorder.start_audio(&id)?;
//! ```

pub mod sample_convert;

#[cfg(target_os = "windows")]
mod com;
#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod subsystem;
#[cfg(target_os = "windows")]
pub mod wasapi_stream;

#[cfg(target_os = "windows")]
pub use device_enumerator::DeviceEnumerator;
#[cfg(target_os = "windows")]
pub use subsystem::WasapiSubsystem;
#[cfg(target_os = "windows")]
pub use wasapi_stream::WasapiInputStream;
