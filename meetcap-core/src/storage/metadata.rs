use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::device::StreamFormat;
use crate::models::error::CaptureError;
use crate::processing::wav_format::BITS_PER_SAMPLE;

/// Metadata stored alongside a finalized recording.
///
/// Serializable for JSON export to downstream pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub session_id: String,
    pub file_path: String,
    pub checksum: String,
    pub duration_secs: f64,
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn new(
        session_id: &str,
        file_path: &Path,
        checksum: &str,
        duration_secs: f64,
        format: StreamFormat,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            file_path: file_path.to_string_lossy().into_owned(),
            checksum: checksum.to_string(),
            duration_secs,
            channels: format.channels,
            sample_rate: format.sample_rate,
            bit_depth: BITS_PER_SAMPLE,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Write recording metadata as a JSON sidecar file.
///
/// Creates `{recording_path}.metadata.json` next to the recording.
pub fn write_metadata(
    metadata: &RecordingMetadata,
    recording_path: &Path,
) -> Result<(), CaptureError> {
    let metadata_path = sidecar_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {e}")))?;
    fs::write(&metadata_path, json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {e}")))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let metadata_path = sidecar_path(recording_path);
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {e}")))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {e}")))
}

fn sidecar_path(recording_path: &Path) -> std::path::PathBuf {
    let mut name = recording_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".metadata.json");
    recording_path.with_file_name(name)
}

/// Compute the SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {e}")))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("meetcap_metadata_test_{}", name))
    }

    #[test]
    fn metadata_round_trip() {
        let recording = temp_file_path("audio_abc.wav");
        fs::write(&recording, b"payload").unwrap();

        let format = StreamFormat {
            channels: 2,
            sample_rate: 48000,
        };
        let metadata = RecordingMetadata::new("abc", &recording, "deadbeef", 1.5, format);
        write_metadata(&metadata, &recording).unwrap();

        let read_back = read_metadata(&recording).unwrap();
        assert_eq!(read_back, metadata);
        assert_eq!(read_back.bit_depth, 24);

        fs::remove_file(&recording).ok();
        fs::remove_file(sidecar_path(&recording)).ok();
    }

    #[test]
    fn sidecar_keeps_recording_extension() {
        let path = Path::new("output/audio_xyz.wav");
        assert_eq!(
            sidecar_path(path),
            Path::new("output/audio_xyz.wav.metadata.json")
        );
    }

    #[test]
    fn checksum_matches_known_digest() {
        let path = temp_file_path("checksum.bin");
        fs::write(&path, b"abc").unwrap();

        let checksum = sha256_file(&path).unwrap();
        assert_eq!(
            checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        fs::remove_file(&path).ok();
    }
}
