//! WAV file format utilities.
//!
//! Generates standard 44-byte RIFF WAV headers for the interim and combined
//! recording files, and parses them back for the overlay mix step.

use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Recordings are fixed at 24 bits per sample.
pub const BITS_PER_SAMPLE: u16 = 24;

/// Bytes per 24-bit sample.
pub const BYTES_PER_SAMPLE: usize = 3;

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = channels * bit_depth / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes()); // PCM format size
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM format code
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Format fields parsed from a WAV `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
}

/// Parse a PCM WAV file, returning its format and the PCM payload.
///
/// Walks the RIFF chunk list so files with extra chunks (LIST, fact) still
/// parse; requires a `fmt ` chunk before `data`.
pub fn parse_wav(bytes: &[u8]) -> Result<(WavInfo, &[u8]), CaptureError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(CaptureError::StorageError("not a RIFF/WAVE file".into()));
    }

    let mut info: Option<WavInfo> = None;
    let mut offset = 12;

    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = u32::from_le_bytes([
            bytes[offset + 4],
            bytes[offset + 5],
            bytes[offset + 6],
            bytes[offset + 7],
        ]) as usize;
        let body_start = offset + 8;
        let body_end = body_start
            .checked_add(size)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| CaptureError::StorageError("truncated WAV chunk".into()))?;
        let body = &bytes[body_start..body_end];

        match id {
            b"fmt " => {
                if body.len() < 16 {
                    return Err(CaptureError::StorageError("short fmt chunk".into()));
                }
                let format_code = u16::from_le_bytes([body[0], body[1]]);
                if format_code != 1 {
                    return Err(CaptureError::StorageError(format!(
                        "unsupported WAV format code {format_code}"
                    )));
                }
                info = Some(WavInfo {
                    channels: u16::from_le_bytes([body[2], body[3]]),
                    sample_rate: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
                    bit_depth: u16::from_le_bytes([body[14], body[15]]),
                });
            }
            b"data" => {
                let info = info
                    .ok_or_else(|| CaptureError::StorageError("data chunk before fmt".into()))?;
                return Ok((info, body));
            }
            _ => {}
        }

        // Chunks are word-aligned; odd sizes carry a pad byte.
        offset = body_end + (size & 1);
    }

    Err(CaptureError::StorageError("no data chunk found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_44_bytes() {
        let header = generate_wav_header(48000, 24, 2, 0);
        assert_eq!(header.len(), 44);
    }

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(48000, 24, 2, 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_48khz_stereo_24bit() {
        let header = generate_wav_header(48000, 24, 2, 14400);

        let channels = u16::from_le_bytes([header[22], header[23]]);
        assert_eq!(channels, 2);

        let sample_rate = u32::from_le_bytes([header[24], header[25], header[26], header[27]]);
        assert_eq!(sample_rate, 48000);

        let byte_rate = u32::from_le_bytes([header[28], header[29], header[30], header[31]]);
        assert_eq!(byte_rate, 288000); // 48000 * 2 * 24/8

        let block_align = u16::from_le_bytes([header[32], header[33]]);
        assert_eq!(block_align, 6); // 2 * 24/8

        let bit_depth = u16::from_le_bytes([header[34], header[35]]);
        assert_eq!(bit_depth, 24);

        let data_size = u32::from_le_bytes([header[40], header[41], header[42], header[43]]);
        assert_eq!(data_size, 14400);

        let chunk_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        assert_eq!(chunk_size, 36 + 14400);
    }

    #[test]
    fn parse_round_trips_generated_header() {
        let payload = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut file = generate_wav_header(44100, 24, 1, payload.len() as u32).to_vec();
        file.extend_from_slice(&payload);

        let (info, data) = parse_wav(&file).unwrap();
        assert_eq!(
            info,
            WavInfo {
                channels: 1,
                sample_rate: 44100,
                bit_depth: 24,
            }
        );
        assert_eq!(data, &payload);
    }

    #[test]
    fn parse_skips_unknown_chunks() {
        let payload = [0xAAu8, 0xBB, 0xCC];
        let mut file = Vec::new();
        file.extend_from_slice(b"RIFF");
        file.extend_from_slice(&0u32.to_le_bytes()); // size not checked
        file.extend_from_slice(b"WAVE");

        file.extend_from_slice(b"fmt ");
        file.extend_from_slice(&16u32.to_le_bytes());
        file.extend_from_slice(&1u16.to_le_bytes()); // PCM
        file.extend_from_slice(&1u16.to_le_bytes()); // mono
        file.extend_from_slice(&8000u32.to_le_bytes());
        file.extend_from_slice(&24000u32.to_le_bytes());
        file.extend_from_slice(&3u16.to_le_bytes());
        file.extend_from_slice(&24u16.to_le_bytes());

        // LIST chunk with odd size and pad byte
        file.extend_from_slice(b"LIST");
        file.extend_from_slice(&3u32.to_le_bytes());
        file.extend_from_slice(&[0x11, 0x22, 0x33, 0x00]);

        file.extend_from_slice(b"data");
        file.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        file.extend_from_slice(&payload);

        let (info, data) = parse_wav(&file).unwrap();
        assert_eq!(info.sample_rate, 8000);
        assert_eq!(data, &payload);
    }

    #[test]
    fn parse_rejects_non_wav() {
        assert!(parse_wav(b"OggS").is_err());
        assert!(parse_wav(&[]).is_err());
    }

    #[test]
    fn parse_rejects_truncated_data_chunk() {
        let mut file = generate_wav_header(48000, 24, 2, 600).to_vec();
        file.extend_from_slice(&[0u8; 12]); // far less than the declared 600
        assert!(parse_wav(&file).is_err());
    }
}
