//! Conversion of decoded frames to canonical PCM using rubato.

use crate::audio::SegmentSize;
use crate::config::ChannelMode;
use crate::error::{Error, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler as _};
use std::path::{Path, PathBuf};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer, SignalSpec};
use tracing::debug;

/// Converts decoded frames into interleaved signed 16-bit little-endian PCM
/// at the output rate and channel layout.
pub struct Resampler {
    source_rate: u32,
    source_channels: usize,
    mode: ChannelMode,
    output_channels: usize,
    rate: Option<RateConverter>,
    interleaved: Option<InterleavedScratch>,
    mapped: Vec<f32>,
    converted: Vec<f32>,
    bytes: Vec<u8>,
    path: PathBuf,
}

struct InterleavedScratch {
    buffer: SampleBuffer<f32>,
    spec: SignalSpec,
    frames: usize,
}

impl Resampler {
    /// Create a resampler for a stream.
    ///
    /// Rate conversion is only set up when `target_rate` differs from
    /// `source_rate`; its chunk size is the segment's frame count.
    pub fn new(
        path: &Path,
        source_rate: u32,
        source_channels: usize,
        mode: ChannelMode,
        target_rate: Option<u32>,
        segment: &SegmentSize,
    ) -> Result<Self> {
        let output_channels = output_channels(mode, source_channels);

        let rate = match target_rate {
            Some(to_rate) if to_rate != source_rate => {
                debug!(
                    "Resampling from {} Hz to {} Hz ({} channels)",
                    source_rate, to_rate, output_channels
                );
                Some(
                    RateConverter::new(source_rate, to_rate, output_channels, segment.frames())
                        .map_err(|reason| Error::InvalidFormat {
                            path: path.to_path_buf(),
                            reason,
                        })?,
                )
            }
            _ => None,
        };

        Ok(Self {
            source_rate,
            source_channels,
            mode,
            output_channels,
            rate,
            interleaved: None,
            mapped: Vec::new(),
            converted: Vec::new(),
            bytes: Vec::new(),
            path: path.to_path_buf(),
        })
    }

    /// Sample rate of the produced PCM.
    pub fn output_rate(&self) -> u32 {
        self.rate.as_ref().map_or(self.source_rate, |r| r.to_rate)
    }

    /// Channel count of the produced PCM.
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Convert one decoded frame.
    ///
    /// The returned bytes are valid until the next call. With rate
    /// conversion active, output lags input by up to one chunk.
    pub fn convert(&mut self, frame: AudioBufferRef<'_>) -> Result<&[u8]> {
        let spec = *frame.spec();
        if spec.channels.count() != self.source_channels || spec.rate != self.source_rate {
            return Err(self.error(format!(
                "stream format changed mid-stream to {} Hz, {} channels",
                spec.rate,
                spec.channels.count()
            )));
        }

        let frames = frame.frames();
        let mut scratch = match self.interleaved.take() {
            Some(s) if s.spec == spec && s.frames >= frames => s,
            _ => InterleavedScratch {
                buffer: SampleBuffer::new(frame.capacity().max(frames) as u64, spec),
                spec,
                frames: frame.capacity().max(frames),
            },
        };
        scratch.buffer.copy_interleaved_ref(frame);

        self.mapped.clear();
        map_channels(
            scratch.buffer.samples(),
            self.source_channels,
            self.mode,
            &mut self.mapped,
        );
        self.interleaved = Some(scratch);

        self.converted.clear();
        if let Some(rate) = self.rate.as_mut() {
            rate.push(&self.mapped, &mut self.converted)
                .map_err(|reason| Error::Decode {
                    path: self.path.clone(),
                    source: reason.into(),
                })?;
            quantize(&self.converted, &mut self.bytes);
        } else {
            quantize(&self.mapped, &mut self.bytes);
        }

        Ok(&self.bytes)
    }

    /// Emit whatever the rate converter still holds.
    pub fn flush(&mut self) -> Result<&[u8]> {
        self.converted.clear();
        if let Some(rate) = self.rate.as_mut() {
            rate.finish(&mut self.converted)
                .map_err(|reason| Error::Decode {
                    path: self.path.clone(),
                    source: reason.into(),
                })?;
        }
        quantize(&self.converted, &mut self.bytes);
        Ok(&self.bytes)
    }

    fn error(&self, reason: String) -> Error {
        Error::Decode {
            path: self.path.clone(),
            source: reason.into(),
        }
    }
}

/// Channel count produced for a source layout.
pub fn output_channels(mode: ChannelMode, source_channels: usize) -> usize {
    match mode {
        ChannelMode::Preserve => source_channels,
        ChannelMode::Mono => 1,
    }
}

/// Append interleaved samples to `output`, downmixing when requested.
fn map_channels(samples: &[f32], channels: usize, mode: ChannelMode, output: &mut Vec<f32>) {
    if mode == ChannelMode::Preserve || channels == 1 {
        output.extend_from_slice(samples);
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let scale = 1.0 / channels as f32;
    output.extend(
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale),
    );
}

/// Replace `output` with `samples` as signed 16-bit little-endian bytes.
fn quantize(samples: &[f32], output: &mut Vec<u8>) {
    output.clear();
    output.reserve(samples.len() * 2);
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let sample_i16 = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        output.extend_from_slice(&sample_i16.to_le_bytes());
    }
}

/// Streaming sample-rate conversion over fixed-size chunks.
///
/// The filter delay is dropped from the head of the output and recovered
/// at the tail by flushing zero-padded chunks, so output frame `n`
/// lines up with input time `n / to_rate`.
struct RateConverter {
    inner: Fft<f32>,
    from_rate: u32,
    to_rate: u32,
    channels: usize,
    pending: Vec<f32>,
    delay_frames: usize,
    consumed_frames: u64,
    produced_frames: u64,
}

impl RateConverter {
    fn new(
        from_rate: u32,
        to_rate: u32,
        channels: usize,
        chunk_size: usize,
    ) -> std::result::Result<Self, String> {
        let inner = Fft::<f32>::new(
            from_rate as usize,
            to_rate as usize,
            chunk_size,
            crate::constants::RESAMPLER_SUB_CHUNKS,
            channels,
            FixedSync::Both,
        )
        .map_err(|e| e.to_string())?;
        let delay_frames = inner.output_delay();

        Ok(Self {
            inner,
            from_rate,
            to_rate,
            channels,
            pending: Vec::new(),
            delay_frames,
            consumed_frames: 0,
            produced_frames: 0,
        })
    }

    /// Queue interleaved samples and convert every full chunk.
    fn push(&mut self, samples: &[f32], output: &mut Vec<f32>) -> std::result::Result<(), String> {
        self.pending.extend_from_slice(samples);

        let chunk_len = self.inner.input_frames_next() * self.channels;
        let mut pos = 0;
        while pos + chunk_len <= self.pending.len() {
            let produced = Self::process_chunk(
                &mut self.inner,
                self.channels,
                &self.pending[pos..pos + chunk_len],
            )?;
            self.consumed_frames += (chunk_len / self.channels) as u64;
            self.emit(&produced, None, output);
            pos += chunk_len;
        }
        self.pending.drain(..pos);

        Ok(())
    }

    /// Convert the remaining input and drain the filter delay.
    fn finish(&mut self, output: &mut Vec<f32>) -> std::result::Result<(), String> {
        self.consumed_frames += (self.pending.len() / self.channels) as u64;
        let expected_total =
            expected_output_frames(self.consumed_frames, self.from_rate, self.to_rate);

        let chunk_len = self.inner.input_frames_next() * self.channels;
        let per_chunk = self.inner.output_frames_next().max(1);
        #[allow(clippy::cast_possible_truncation)]
        let missing = expected_total.saturating_sub(self.produced_frames) as usize;
        let max_chunks = (self.delay_frames + missing).div_ceil(per_chunk) + 1;

        let mut input = std::mem::take(&mut self.pending);
        for _ in 0..max_chunks {
            if self.produced_frames >= expected_total {
                break;
            }
            input.resize(chunk_len, 0.0);
            let produced = Self::process_chunk(&mut self.inner, self.channels, &input)?;
            input.clear();
            let wanted = expected_total - self.produced_frames;
            self.emit(&produced, Some(wanted), output);
        }

        Ok(())
    }

    /// Append converted frames, skipping what is left of the filter delay.
    fn emit(&mut self, produced: &[f32], limit: Option<u64>, output: &mut Vec<f32>) {
        let available = produced.len() / self.channels;
        let skip = self.delay_frames.min(available);
        self.delay_frames -= skip;

        let mut take = available - skip;
        if let Some(limit) = limit {
            take = take.min(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        let start = skip * self.channels;
        output.extend_from_slice(&produced[start..start + take * self.channels]);
        self.produced_frames += take as u64;
    }

    fn process_chunk(
        inner: &mut Fft<f32>,
        channels: usize,
        chunk: &[f32],
    ) -> std::result::Result<Vec<f32>, String> {
        let frames = chunk.len() / channels;
        let input_adapter = InterleavedSlice::new(chunk, channels, frames)
            .map_err(|e| format!("failed to create input adapter: {e}"))?;

        let resampled = inner
            .process(&input_adapter, 0, None)
            .map_err(|e| e.to_string())?;

        Ok(resampled.take_data())
    }
}

/// Output frames corresponding to `input_frames` at the rate ratio.
fn expected_output_frames(input_frames: u64, from_rate: u32, to_rate: u32) -> u64 {
    (input_frames * u64::from(to_rate)).div_ceil(u64::from(from_rate))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use symphonia::core::audio::{AudioBuffer, Channels, Signal};

    fn sine_frame(frames: usize, rate: u32, channels: Channels) -> AudioBuffer<f32> {
        let spec = SignalSpec::new(rate, channels);
        let mut buffer = AudioBuffer::<f32>::new(frames as u64, spec);
        buffer.render_reserved(Some(frames));
        for ch in 0..spec.channels.count() {
            for (i, s) in buffer.chan_mut(ch).iter_mut().enumerate() {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / rate as f32;
                *s = 0.5 * (t * 440.0 * std::f32::consts::TAU).sin();
            }
        }
        buffer
    }

    fn segment(frames: u64, channels: usize) -> SegmentSize {
        SegmentSize::compute(Some(frames), channels).unwrap()
    }

    #[test]
    fn test_quantize_clamps_and_encodes_le() {
        let mut out = Vec::new();
        quantize(&[0.0, 1.0, -1.0, 2.0], &mut out);
        assert_eq!(out.len(), 8);
        assert_eq!(i16::from_le_bytes([out[0], out[1]]), 0);
        assert_eq!(i16::from_le_bytes([out[2], out[3]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([out[4], out[5]]), -i16::MAX);
        assert_eq!(i16::from_le_bytes([out[6], out[7]]), i16::MAX);
    }

    #[test]
    fn test_map_channels_downmixes_to_mono() {
        let mut out = Vec::new();
        map_channels(&[1.0, 0.0, 0.5, 0.5], 2, ChannelMode::Mono, &mut out);
        assert_eq!(out, vec![0.5, 0.5]);
    }

    #[test]
    fn test_convert_same_rate_keeps_frame_count() {
        let stereo = Channels::FRONT_LEFT | Channels::FRONT_RIGHT;
        let mut resampler = Resampler::new(
            Path::new("t.wav"),
            44_100,
            2,
            ChannelMode::Preserve,
            Some(44_100),
            &segment(1024, 2),
        )
        .unwrap();

        let frame = sine_frame(1024, 44_100, stereo);
        let bytes = resampler.convert(AudioBufferRef::F32(std::borrow::Cow::Borrowed(&frame))).unwrap();
        assert_eq!(bytes.len(), 1024 * 2 * 2);
        assert!(resampler.flush().unwrap().is_empty());
    }

    #[test]
    fn test_convert_downsamples_with_proportional_length() {
        let mut resampler = Resampler::new(
            Path::new("t.wav"),
            48_000,
            1,
            ChannelMode::Preserve,
            Some(16_000),
            &segment(1024, 1),
        )
        .unwrap();
        assert_eq!(resampler.output_rate(), 16_000);

        let frame = sine_frame(1000, 48_000, Channels::FRONT_LEFT);
        let mut total = 0;
        for _ in 0..48 {
            let chunk = AudioBufferRef::F32(std::borrow::Cow::Borrowed(&frame));
            total += resampler.convert(chunk).unwrap().len();
        }
        total += resampler.flush().unwrap().len();

        // 48000 input frames at a 3:1 ratio.
        assert_eq!(total / 2, 16_000);
    }

    #[test]
    fn test_convert_rejects_layout_change() {
        let mut resampler = Resampler::new(
            Path::new("t.wav"),
            44_100,
            1,
            ChannelMode::Preserve,
            None,
            &segment(512, 1),
        )
        .unwrap();

        let stereo = sine_frame(512, 44_100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let result = resampler.convert(AudioBufferRef::F32(std::borrow::Cow::Borrowed(&stereo)));
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_downsampled_impulse_is_not_delayed() {
        let mut resampler = Resampler::new(
            Path::new("t.wav"),
            48_000,
            1,
            ChannelMode::Preserve,
            Some(16_000),
            &segment(1024, 1),
        )
        .unwrap();

        // 0.5 s of silence with one click at input frame 6000 (output 2000).
        let spec = SignalSpec::new(48_000, Channels::FRONT_LEFT);
        let mut frame = AudioBuffer::<f32>::new(24_000, spec);
        frame.render_reserved(Some(24_000));
        frame.chan_mut(0)[6_000] = 1.0;

        let mut bytes = resampler
            .convert(AudioBufferRef::F32(std::borrow::Cow::Borrowed(&frame)))
            .unwrap()
            .to_vec();
        bytes.extend_from_slice(resampler.flush().unwrap());

        let samples: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples.len(), 8_000);
        let peak = samples
            .iter()
            .enumerate()
            .max_by_key(|(_, s)| s.unsigned_abs())
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak.abs_diff(2_000) <= 1, "peak at {peak}");
    }

    #[test]
    fn test_expected_output_frames_rounds_up() {
        assert_eq!(expected_output_frames(3, 3, 1), 1);
        assert_eq!(expected_output_frames(4, 3, 1), 2);
        assert_eq!(expected_output_frames(44_100, 44_100, 48_000), 48_000);
    }
}
