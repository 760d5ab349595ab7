//! MP3 encoding of canonical PCM buffers using LAME.

use crate::config::EncodeQuality;
use crate::constants::{
    CANONICAL_SAMPLE_WIDTH, DEFAULT_CHANNELS, DEFAULT_MP3_BIT_RATE, MP3_BIT_RATES, MP3_FRAME_SIZE,
    MP3_MAX_CHANNELS,
};
use crate::error::{Error, Result};
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A request to encode one PCM buffer to an MP3 file.
#[derive(Debug, Clone)]
pub struct EncodeRequest<'a> {
    /// Interleaved signed 16-bit little-endian samples.
    pub pcm: &'a [u8],
    /// Destination file, created or truncated.
    pub output_path: PathBuf,
    /// Sample rate of `pcm` in Hz.
    pub sample_rate: u32,
    /// Target bit rate in bits per second.
    pub bit_rate: u32,
    /// Interleaved channels in `pcm`.
    pub channels: u16,
    /// Encoder quality preset.
    pub quality: EncodeQuality,
}

impl<'a> EncodeRequest<'a> {
    /// Create a mono request at the default bit rate.
    pub fn new(pcm: &'a [u8], output_path: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            pcm,
            output_path: output_path.into(),
            sample_rate,
            bit_rate: DEFAULT_MP3_BIT_RATE,
            channels: DEFAULT_CHANNELS,
            quality: EncodeQuality::default(),
        }
    }

    /// Set the bit rate in bits per second.
    #[must_use]
    pub fn bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    /// Set the channel count.
    #[must_use]
    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Set the quality preset.
    #[must_use]
    pub fn quality(mut self, quality: EncodeQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Check parameters and buffer alignment without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(self.error("sample rate must be greater than 0".to_string()));
        }
        if self.bit_rate == 0 {
            return Err(self.error("bit rate must be greater than 0".to_string()));
        }
        if self.channels == 0 || self.channels > MP3_MAX_CHANNELS {
            return Err(self.error(format!(
                "channel count must be between 1 and {MP3_MAX_CHANNELS}, got {}",
                self.channels
            )));
        }

        let frame_bytes = usize::from(self.channels) * CANONICAL_SAMPLE_WIDTH;
        if self.pcm.len() % frame_bytes != 0 {
            return Err(self.error(format!(
                "buffer length {} is not a multiple of {frame_bytes} bytes per frame",
                self.pcm.len()
            )));
        }

        Ok(())
    }

    fn error(&self, reason: String) -> Error {
        Error::Encode {
            path: self.output_path.clone(),
            reason,
        }
    }
}

/// Encode a PCM buffer to an MP3 file.
///
/// Invalid requests are rejected before the output file is created. A
/// failure after that point may leave a truncated file behind.
pub fn save_as_mp3(request: &EncodeRequest<'_>) -> Result<()> {
    request.validate()?;

    let bitrate = nearest_bitrate(request.bit_rate);
    let mut builder = Builder::new()
        .ok_or_else(|| request.error("failed to create LAME encoder".to_string()))?;
    builder
        .set_num_channels(u8::try_from(request.channels).map_err(|e| request.error(e.to_string()))?)
        .map_err(|e| request.error(format!("unsupported channel count: {e:?}")))?;
    builder
        .set_sample_rate(request.sample_rate)
        .map_err(|e| request.error(format!("unsupported sample rate: {e:?}")))?;
    builder
        .set_brate(bitrate)
        .map_err(|e| request.error(format!("unsupported bit rate: {e:?}")))?;
    builder
        .set_quality(lame_quality(request.quality))
        .map_err(|e| request.error(format!("unsupported quality: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| request.error(format!("failed to initialize LAME encoder: {e:?}")))?;

    debug!(
        "Encoding {} bytes at {} Hz, {} channel(s), requested {} bit/s",
        request.pcm.len(),
        request.sample_rate,
        request.channels,
        request.bit_rate
    );

    let file = File::create(&request.output_path).map_err(|e| request.error(e.to_string()))?;
    let mut writer = BufWriter::new(file);

    let samples = pcm_to_samples(request.pcm);
    let channels = usize::from(request.channels);
    let mut mp3 = Vec::new();

    for chunk in samples.chunks(MP3_FRAME_SIZE * channels) {
        mp3.clear();
        mp3.reserve(mp3lame_encoder::max_required_buffer_size(chunk.len() / channels));
        let result = if channels == 1 {
            encoder.encode_to_vec(MonoPcm(chunk), &mut mp3)
        } else {
            encoder.encode_to_vec(InterleavedPcm(chunk), &mut mp3)
        };
        result.map_err(|e| request.error(format!("encoding failed: {e:?}")))?;
        writer
            .write_all(&mp3)
            .map_err(|e| request.error(e.to_string()))?;
    }

    mp3.clear();
    mp3.reserve(mp3lame_encoder::max_required_buffer_size(MP3_FRAME_SIZE));
    encoder
        .flush_to_vec::<FlushNoGap>(&mut mp3)
        .map_err(|e| request.error(format!("flushing encoder failed: {e:?}")))?;
    writer
        .write_all(&mp3)
        .map_err(|e| request.error(e.to_string()))?;
    writer.flush().map_err(|e| request.error(e.to_string()))?;

    info!(
        "Wrote {} ({} frames)",
        request.output_path.display(),
        samples.len() / channels
    );

    Ok(())
}

/// Convenience wrapper around [`save_as_mp3`] with the default quality.
pub fn save_pcm_as_mp3(
    pcm: &[u8],
    output_path: &Path,
    sample_rate: u32,
    bit_rate: u32,
    channels: u16,
) -> Result<()> {
    save_as_mp3(
        &EncodeRequest::new(pcm, output_path, sample_rate)
            .bit_rate(bit_rate)
            .channels(channels),
    )
}

/// Decode little-endian 16-bit samples.
fn pcm_to_samples(pcm: &[u8]) -> Vec<i16> {
    pcm.chunks_exact(CANONICAL_SAMPLE_WIDTH)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Snap a bit rate to the closest rate MPEG-1 Layer III supports.
fn nearest_bitrate(bit_rate: u32) -> Bitrate {
    let nearest = MP3_BIT_RATES
        .iter()
        .copied()
        .min_by_key(|&rate| rate.abs_diff(bit_rate))
        .unwrap_or(DEFAULT_MP3_BIT_RATE);

    match nearest {
        8_000 => Bitrate::Kbps8,
        16_000 => Bitrate::Kbps16,
        24_000 => Bitrate::Kbps24,
        32_000 => Bitrate::Kbps32,
        40_000 => Bitrate::Kbps40,
        48_000 => Bitrate::Kbps48,
        64_000 => Bitrate::Kbps64,
        80_000 => Bitrate::Kbps80,
        96_000 => Bitrate::Kbps96,
        112_000 => Bitrate::Kbps112,
        160_000 => Bitrate::Kbps160,
        192_000 => Bitrate::Kbps192,
        224_000 => Bitrate::Kbps224,
        256_000 => Bitrate::Kbps256,
        320_000 => Bitrate::Kbps320,
        _ => Bitrate::Kbps128,
    }
}

fn lame_quality(quality: EncodeQuality) -> Quality {
    match quality {
        EncodeQuality::High => Quality::Best,
        EncodeQuality::Standard => Quality::Good,
        EncodeQuality::Fast => Quality::Worst,
    }
}
