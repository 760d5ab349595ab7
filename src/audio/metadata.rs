//! Stream metadata resolved after extraction.

use serde::Serialize;
use symphonia::core::codecs::CodecParameters;

/// Final sample rate and bit rate of a decoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioMetadata {
    /// Sample rate of the canonical buffer in Hz.
    pub sample_rate: u32,
    /// Average bit rate of the source stream in bits per second.
    pub bit_rate: u32,
    /// Interleaved channels in the canonical buffer.
    pub channels: u16,
    /// Frames in the canonical buffer.
    pub frames: u64,
    /// Sample rate of the source stream in Hz.
    pub source_sample_rate: u32,
}

impl AudioMetadata {
    /// Duration of the canonical buffer in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / f64::from(self.sample_rate)
    }
}

/// Counters gathered by the extraction loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    packets: u64,
    packet_bytes: u64,
    decoded_frames: u64,
    decoded_rate: Option<u32>,
}

impl ExtractionStats {
    /// Record a packet submitted to the decoder.
    pub fn record_packet(&mut self, bytes: usize) {
        self.packets += 1;
        self.packet_bytes += bytes as u64;
    }

    /// Record a decoded frame and the rate it was decoded at.
    pub fn record_frame(&mut self, frames: usize, rate: u32) {
        self.decoded_frames += frames as u64;
        self.decoded_rate = Some(rate);
    }

    /// Packets submitted to the decoder.
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Source frames decoded.
    pub fn decoded_frames(&self) -> u64 {
        self.decoded_frames
    }

    /// Derive the final metadata.
    ///
    /// The source rate comes from the decoded frames when any were decoded,
    /// otherwise from the decoder's resolved parameters. The bit rate is
    /// measured from the packets consumed; with nothing decoded it falls
    /// back to the coded sample width. Returns `None` when either value
    /// cannot be resolved.
    pub fn finalize(
        &self,
        resolved: &CodecParameters,
        output_rate: u32,
        output_channels: usize,
        output_bytes: usize,
    ) -> Option<AudioMetadata> {
        let source_sample_rate = self.decoded_rate.or(resolved.sample_rate)?;
        if source_sample_rate == 0 || output_rate == 0 {
            return None;
        }

        let bit_rate = if self.decoded_frames > 0 {
            let bits = u128::from(self.packet_bytes) * 8 * u128::from(source_sample_rate);
            let rate = (bits + u128::from(self.decoded_frames) / 2) / u128::from(self.decoded_frames);
            u32::try_from(rate).ok()?
        } else {
            let width = resolved.bits_per_coded_sample.or(resolved.bits_per_sample)?;
            let channels = resolved.channels.map(|c| c.count())?;
            u32::try_from(u64::from(width) * channels as u64 * u64::from(source_sample_rate)).ok()?
        };
        if bit_rate == 0 {
            return None;
        }

        let channels = u16::try_from(output_channels).ok().filter(|&c| c > 0)?;
        let frame_bytes = output_channels * crate::constants::CANONICAL_SAMPLE_WIDTH;

        Some(AudioMetadata {
            sample_rate: output_rate,
            bit_rate,
            channels,
            frames: (output_bytes / frame_bytes) as u64,
            source_sample_rate,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use symphonia::core::audio::Channels;

    fn pcm_params() -> CodecParameters {
        let mut params = CodecParameters::new();
        params
            .with_sample_rate(44_100)
            .with_bits_per_coded_sample(16)
            .with_channels(Channels::FRONT_LEFT);
        params
    }

    #[test]
    fn test_bit_rate_measured_from_packets() {
        let mut stats = ExtractionStats::default();
        // One second of 16-bit mono PCM in 1024-frame packets.
        for _ in 0..43 {
            stats.record_packet(2048);
            stats.record_frame(1024, 44_100);
        }
        stats.record_packet(2 * 68);
        stats.record_frame(68, 44_100);
        assert_eq!(stats.decoded_frames(), 44_100);

        let meta = stats.finalize(&pcm_params(), 44_100, 1, 88_200).unwrap();
        assert_eq!(meta.sample_rate, 44_100);
        assert_eq!(meta.source_sample_rate, 44_100);
        assert_eq!(meta.bit_rate, 705_600);
        assert_eq!(meta.frames, 44_100);
        assert_eq!(meta.duration_secs(), 1.0);
    }

    #[test]
    fn test_decoded_rate_overrides_declared_rate() {
        let mut stats = ExtractionStats::default();
        stats.record_packet(418);
        stats.record_frame(1152, 48_000);

        let meta = stats.finalize(&pcm_params(), 48_000, 2, 1152 * 4).unwrap();
        assert_eq!(meta.source_sample_rate, 48_000);
        assert_eq!(meta.channels, 2);
        assert_eq!(meta.frames, 1152);
    }

    #[test]
    fn test_fallback_without_decoded_frames() {
        let stats = ExtractionStats::default();
        let meta = stats.finalize(&pcm_params(), 44_100, 1, 0).unwrap();
        assert_eq!(meta.bit_rate, 705_600);
        assert_eq!(meta.frames, 0);
    }

    #[test]
    fn test_unresolvable_metadata() {
        let stats = ExtractionStats::default();
        assert!(stats.finalize(&CodecParameters::new(), 44_100, 1, 0).is_none());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut stats = ExtractionStats::default();
        stats.record_packet(1000);
        stats.record_frame(1152, 44_100);
        let first = stats.finalize(&pcm_params(), 44_100, 1, 2304);
        let second = stats.finalize(&pcm_params(), 44_100, 1, 2304);
        assert_eq!(first, second);
    }
}
