//! Session finalization: drain the chunk buffers into interim WAV files and
//! combine them into one output.
//!
//! Callers must close the session's streams before finalizing — this module
//! never touches stream handles, only buffers and files.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::capture::chunk_queue::ChunkQueue;
use crate::capture::session::CaptureSession;
use crate::models::config::SessionConfig;
use crate::models::device::StreamFormat;
use crate::models::error::CaptureError;
use crate::processing::overlay_mixer;
use crate::processing::wav_format::{self, BITS_PER_SAMPLE, BYTES_PER_SAMPLE};
use crate::storage::metadata::{self, RecordingMetadata};

/// Interim speaker-only file for a session.
pub fn speaker_path(config: &SessionConfig, session_id: &str) -> PathBuf {
    config
        .output_directory
        .join(format!("spkr_{session_id}.wav"))
}

/// Interim mic-only file for a session.
pub fn mic_path(config: &SessionConfig, session_id: &str) -> PathBuf {
    config.output_directory.join(format!("mic_{session_id}.wav"))
}

/// Final combined output file for a session.
pub fn combined_path(config: &SessionConfig, session_id: &str) -> PathBuf {
    config
        .output_directory
        .join(format!("audio_{session_id}.wav"))
}

/// Drain both session buffers and produce the combined output file.
///
/// Each non-empty buffer is written in strict FIFO order to its interim file.
/// If only one interim file exists it is renamed to the combined path; if
/// both exist they are overlay-mixed and the interims deleted. Both buffers
/// empty is an error, not a silent no-op — which also means finalize cannot
/// be called twice for the same session without re-populating the buffers.
pub fn finalize(
    session: &CaptureSession,
    config: &SessionConfig,
) -> Result<PathBuf, CaptureError> {
    fs::create_dir_all(&config.output_directory).map_err(|e| {
        CaptureError::StorageError(format!("failed to create output directory: {e}"))
    })?;

    let format = session.format();
    let session_id = session.session_id();
    let spkr = speaker_path(config, session_id);
    let mic = mic_path(config, session_id);
    let combined = combined_path(config, session_id);

    let wrote_spkr = drain_to_wav(session.speaker_buffer(), format, &spkr)?;
    let wrote_mic = drain_to_wav(session.mic_buffer(), format, &mic)?;

    match (wrote_spkr, wrote_mic) {
        (true, false) => rename(&spkr, &combined)?,
        (false, true) => rename(&mic, &combined)?,
        (true, true) => {
            mix_files(&spkr, &mic, format, &combined)?;
            remove(&spkr)?;
            remove(&mic)?;
        }
        (false, false) => return Err(CaptureError::NoAudioCaptured),
    }

    if config.write_metadata {
        let checksum = metadata::sha256_file(&combined)?;
        let duration = duration_secs(&combined, format)?;
        let record = RecordingMetadata::new(session_id, &combined, &checksum, duration, format);
        metadata::write_metadata(&record, &combined)?;
    }

    Ok(combined)
}

/// Write all buffered chunks to a 24-bit PCM WAV file, in arrival order.
///
/// Returns `false` without creating a file when the buffer never received a
/// chunk — a silent stream still produces a file, only an absent one is
/// skipped.
fn drain_to_wav(
    queue: &ChunkQueue,
    format: StreamFormat,
    path: &Path,
) -> Result<bool, CaptureError> {
    if queue.is_empty() {
        return Ok(false);
    }

    let chunks = queue.drain();
    let data_size: usize = chunks.iter().map(|chunk| chunk.len()).sum();

    let mut file = File::create(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to create {}: {e}", path.display())))?;
    let header = wav_format::generate_wav_header(
        format.sample_rate,
        BITS_PER_SAMPLE,
        format.channels,
        data_size as u32,
    );
    file.write_all(&header)
        .map_err(|e| CaptureError::StorageError(format!("write failed: {e}")))?;
    for chunk in &chunks {
        file.write_all(chunk)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {e}")))?;
    }
    file.flush()
        .map_err(|e| CaptureError::StorageError(format!("flush failed: {e}")))?;

    Ok(true)
}

/// Overlay-mix two interim WAV files into the combined output.
fn mix_files(
    a: &Path,
    b: &Path,
    format: StreamFormat,
    combined: &Path,
) -> Result<(), CaptureError> {
    let payload_a = read_payload(a)?;
    let payload_b = read_payload(b)?;
    let mixed = overlay_mixer::overlay(&payload_a, &payload_b);

    let mut file = File::create(combined).map_err(|e| {
        CaptureError::StorageError(format!("failed to create {}: {e}", combined.display()))
    })?;
    let header = wav_format::generate_wav_header(
        format.sample_rate,
        BITS_PER_SAMPLE,
        format.channels,
        mixed.len() as u32,
    );
    file.write_all(&header)
        .map_err(|e| CaptureError::StorageError(format!("write failed: {e}")))?;
    file.write_all(&mixed)
        .map_err(|e| CaptureError::StorageError(format!("write failed: {e}")))?;
    file.flush()
        .map_err(|e| CaptureError::StorageError(format!("flush failed: {e}")))?;
    Ok(())
}

fn read_payload(path: &Path) -> Result<Vec<u8>, CaptureError> {
    let bytes = fs::read(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read {}: {e}", path.display())))?;
    let (_, payload) = wav_format::parse_wav(&bytes)?;
    Ok(payload.to_vec())
}

fn rename(from: &Path, to: &Path) -> Result<(), CaptureError> {
    fs::rename(from, to).map_err(|e| {
        CaptureError::StorageError(format!(
            "failed to rename {} to {}: {e}",
            from.display(),
            to.display()
        ))
    })
}

fn remove(path: &Path) -> Result<(), CaptureError> {
    fs::remove_file(path).map_err(|e| {
        CaptureError::StorageError(format!("failed to delete {}: {e}", path.display()))
    })
}

fn duration_secs(path: &Path, format: StreamFormat) -> Result<f64, CaptureError> {
    let data_len = fs::metadata(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to stat {}: {e}", path.display())))?
        .len()
        .saturating_sub(wav_format::WAV_HEADER_SIZE as u64);
    let frame_bytes = format.channels as u64 * BYTES_PER_SAMPLE as u64;
    Ok(data_len as f64 / (frame_bytes as f64 * format.sample_rate as f64))
}
