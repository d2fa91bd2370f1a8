use crate::foundation::error::{WeaveError, WeaveResult};
use std::path::Path;

/// Encode interleaved `f32` samples as a canonical 16-bit PCM WAV file.
pub fn encode_wav_pcm16(samples: &[f32], sample_rate: u32, channels: u16) -> WeaveResult<Vec<u8>> {
    if sample_rate == 0 || channels == 0 {
        return Err(WeaveError::invalid_argument(
            "wav sample_rate/channels must be non-zero",
        ));
    }
    let data_len = u32::try_from(samples.len() * 2)
        .map_err(|_| WeaveError::invalid_argument("audio too long for a wav file"))?;
    let block_align = channels * 2;
    let byte_rate = sample_rate * u32::from(block_align);

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    Ok(out)
}

pub fn write_wav_pcm16(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> WeaveResult<()> {
    use anyhow::Context as _;

    let bytes = encode_wav_pcm16(samples, sample_rate, channels)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create audio directory '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write wav file '{}'", path.display()))?;
    Ok(())
}
