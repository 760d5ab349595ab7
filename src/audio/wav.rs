//! WAV export of canonical PCM buffers.

use crate::constants::CANONICAL_SAMPLE_WIDTH;
use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write a canonical PCM buffer to a 16-bit WAV file.
pub fn write_wav(path: &Path, pcm: &[u8], sample_rate: u32, channels: u16) -> Result<()> {
    let frame_bytes = usize::from(channels) * CANONICAL_SAMPLE_WIDTH;
    if channels == 0 || pcm.len() % frame_bytes != 0 {
        return Err(Error::Encode {
            path: path.to_path_buf(),
            reason: format!(
                "buffer length {} does not hold whole {channels}-channel frames",
                pcm.len()
            ),
        });
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| Error::WavWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    for bytes in pcm.chunks_exact(CANONICAL_SAMPLE_WIDTH) {
        writer
            .write_sample(i16::from_le_bytes([bytes[0], bytes[1]]))
            .map_err(|e| Error::WavWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    writer.finalize().map_err(|e| Error::WavWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
