//! Fixed per-session segment size.

use crate::constants::CANONICAL_SAMPLE_WIDTH;
use std::num::NonZeroUsize;
use symphonia::core::codecs::{
    CODEC_TYPE_AAC, CODEC_TYPE_MP1, CODEC_TYPE_MP2, CODEC_TYPE_MP3, CODEC_TYPE_VORBIS, CodecType,
};

/// Maximum frames per packet for codecs whose demuxers leave it unset.
///
/// MPEG audio and AAC have a fixed frame size. Vorbis packets decode to at
/// most half the long block size, read from the identification header in
/// `extra_data`.
pub fn native_frame_size(codec: CodecType, extra_data: Option<&[u8]>) -> Option<u64> {
    match codec {
        CODEC_TYPE_MP1 => Some(384),
        CODEC_TYPE_MP2 | CODEC_TYPE_MP3 => Some(1152),
        CODEC_TYPE_AAC => Some(1024),
        CODEC_TYPE_VORBIS => extra_data.and_then(vorbis_max_frames),
        _ => None,
    }
}

/// Half of `blocksize_1` from a Vorbis identification header.
fn vorbis_max_frames(header: &[u8]) -> Option<u64> {
    if header.len() < 30 || header[0] != 1 || &header[1..7] != b"vorbis" {
        return None;
    }
    let exponent = header[28] >> 4;
    // Legal long block sizes are 64 through 8192.
    if !(6..=13).contains(&exponent) {
        return None;
    }
    Some((1u64 << exponent) / 2)
}

/// Block size used to stage resampler input and commit output bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSize {
    frames: NonZeroUsize,
    channels: NonZeroUsize,
}

impl SegmentSize {
    /// Derive the segment size from the decoder's frame size and the
    /// canonical output channel count.
    ///
    /// Returns an error message when either input is unknown or zero, or
    /// when the byte size would overflow.
    pub fn compute(
        max_frames_per_packet: Option<u64>,
        channels: usize,
    ) -> std::result::Result<Self, String> {
        let frames = max_frames_per_packet
            .ok_or_else(|| "decoder frame size is not known".to_string())?;
        let frames = usize::try_from(frames)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| format!("decoder frame size {frames} is not usable"))?;
        let channels =
            NonZeroUsize::new(channels).ok_or_else(|| "channel count is zero".to_string())?;

        frames
            .get()
            .checked_mul(channels.get())
            .and_then(|n| n.checked_mul(CANONICAL_SAMPLE_WIDTH))
            .ok_or_else(|| "segment size overflows".to_string())?;

        Ok(Self { frames, channels })
    }

    /// Frames per segment.
    pub fn frames(&self) -> usize {
        self.frames.get()
    }

    /// Interleaved channels per frame.
    pub fn channels(&self) -> usize {
        self.channels.get()
    }

    /// Bytes per segment of canonical PCM.
    pub fn bytes(&self) -> usize {
        self.frames.get() * self.channels.get() * CANONICAL_SAMPLE_WIDTH
    }
}
