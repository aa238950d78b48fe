//! Sample conversion between WASAPI's shared-mode Float32 delivery and the
//! 24-bit PCM chunks the capture session expects.
//!
//! Shared-mode streams always run at the endpoint's mix format; when that
//! differs from the session format the capture thread remaps channels and
//! resamples before packing to 24-bit.

use meetcap_core::processing::overlay_mixer::I24_MAX;
use meetcap_core::processing::wav_format::BYTES_PER_SAMPLE;

/// Remap interleaved samples from `from` channels to `to` channels.
///
/// Frames are downmixed to mono by averaging, then spread across the target
/// channel count. Equal counts pass through unchanged.
pub fn remap_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let from = from as usize;
    let to = to as usize;
    let frame_count = samples.len() / from;
    let scale = 1.0 / from as f32;

    let mut output = Vec::with_capacity(frame_count * to);
    for frame in 0..frame_count {
        let mut sum = 0.0f32;
        for ch in 0..from {
            sum += samples[frame * from + ch];
        }
        let mono = sum * scale;
        for _ in 0..to {
            output.push(mono);
        }
    }
    output
}

/// Linear-interpolation resampling for interleaved audio.
///
/// Returns the input unchanged if the rates already match.
pub fn resample_linear(
    samples: &[f32],
    channels: u16,
    source_rate: f64,
    target_rate: f64,
) -> Vec<f32> {
    if (source_rate - target_rate).abs() < 0.01 || samples.is_empty() {
        return samples.to_vec();
    }

    let ch = channels.max(1) as usize;
    let frame_count = samples.len() / ch;
    let ratio = target_rate / source_rate;
    let output_frames = (frame_count as f64 * ratio) as usize;
    if output_frames == 0 {
        return Vec::new();
    }

    let mut output = vec![0.0f32; output_frames * ch];
    for i in 0..output_frames {
        let source_index = i as f64 / ratio;
        let index = source_index as usize;
        let fraction = (source_index - index as f64) as f32;

        for c in 0..ch {
            if index + 1 < frame_count {
                output[i * ch + c] = samples[index * ch + c] * (1.0 - fraction)
                    + samples[(index + 1) * ch + c] * fraction;
            } else if index < frame_count {
                output[i * ch + c] = samples[index * ch + c];
            }
        }
    }
    output
}

/// Convert f32 samples `[-1.0, 1.0]` to 24-bit PCM (little-endian bytes).
///
/// Clamps out-of-range values. Output length = `samples.len() * 3` bytes.
pub fn convert_to_int24_pcm(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = (clamped * I24_MAX as f32) as i32;
        data.extend_from_slice(&value.to_le_bytes()[0..BYTES_PER_SAMPLE]);
    }
    data
}

/// Accumulates converted bytes and cuts them into fixed-size chunks, one per
/// callback delivery.
///
/// A partial tail smaller than one chunk stays pending and is dropped when
/// the stream closes, matching fixed frames-per-buffer delivery.
#[derive(Debug)]
pub struct ChunkFramer {
    chunk_bytes: usize,
    pending: Vec<u8>,
}

impl ChunkFramer {
    pub fn new(chunk_frames: usize, channels: u16) -> Self {
        Self {
            chunk_bytes: chunk_frames * channels as usize * BYTES_PER_SAMPLE,
            pending: Vec::new(),
        }
    }

    /// Append bytes and return the full chunks now ready for delivery.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while self.pending.len() >= self.chunk_bytes {
            let rest = self.pending.split_off(self.chunk_bytes);
            chunks.push(std::mem::replace(&mut self.pending, rest));
        }
        chunks
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
