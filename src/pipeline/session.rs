//! Decode session: one file from container to canonical PCM.

use crate::audio::{
    AudioMetadata, BufferAccumulator, CodecSession, Container, ExtractionStats, Resampler,
    SegmentSize, StreamDescriptor, native_frame_size, output_channels, select_audio_stream,
};
use crate::config::DecodeConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Progress of a session through the decode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No file processed yet.
    Uninitialized,
    /// Container opened and probed.
    ContainerOpened,
    /// Audio stream selected.
    StreamSelected,
    /// Decoder opened.
    CodecOpened,
    /// Segment size fixed and resampler ready.
    SegmentSized,
    /// Packet loop running.
    Extracting,
    /// Extraction finished and metadata resolved.
    Finalized,
    /// A stage failed; see the returned error.
    Failed,
}

/// Decodes one audio file into a canonical PCM buffer.
///
/// A session owns the container, decoder and resampler while a file is
/// processed and drops all three when processing ends, whether it
/// succeeded or not. Sessions are single-use: call [`reset`](Self::reset)
/// before processing another file.
pub struct PipelineSession {
    config: DecodeConfig,
    state: PipelineState,
    path: Option<PathBuf>,
    container: Option<Container>,
    codec: Option<CodecSession>,
    resampler: Option<Resampler>,
    stream: Option<StreamDescriptor>,
    segment: Option<SegmentSize>,
    stats: ExtractionStats,
    buffer: Vec<u8>,
    metadata: Option<AudioMetadata>,
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new(DecodeConfig::default())
    }
}

impl PipelineSession {
    /// Create an empty session.
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            config,
            state: PipelineState::Uninitialized,
            path: None,
            container: None,
            codec: None,
            resampler: None,
            stream: None,
            segment: None,
            stats: ExtractionStats::default(),
            buffer: Vec::new(),
            metadata: None,
        }
    }

    /// Create a session and process `path` with it.
    pub fn from_file(path: &Path, config: DecodeConfig) -> Result<Self> {
        let mut session = Self::new(config);
        session.process_audio_file(path)?;
        Ok(session)
    }

    /// Decode a whole file into the session buffer.
    ///
    /// On [`Error::Decode`] the bytes decoded before the failure stay in the
    /// buffer and metadata is still resolved; every earlier failure leaves
    /// the buffer empty and metadata absent.
    pub fn process_audio_file(&mut self, path: &Path) -> Result<()> {
        if self.state != PipelineState::Uninitialized {
            return Err(Error::SessionInUse {
                path: self.path.clone().unwrap_or_default(),
            });
        }

        info!("Processing: {}", path.display());
        self.path = Some(path.to_path_buf());

        let result = self.run(path);
        match &result {
            Ok(()) => {
                self.state = PipelineState::Finalized;
                if let Some(meta) = &self.metadata {
                    info!(
                        "Decoded {:.2}s at {} Hz, {} channel(s), {} bit/s source",
                        meta.duration_secs(),
                        meta.sample_rate,
                        meta.channels,
                        meta.bit_rate
                    );
                }
            }
            Err(e) => {
                warn!("Processing {} failed in {:?}: {}", path.display(), self.state, e);
                self.state = PipelineState::Failed;
            }
        }

        self.release();
        result
    }

    fn run(&mut self, path: &Path) -> Result<()> {
        self.open_container(path)?;
        self.find_audio_stream(path)?;
        self.open_codec(path)?;
        self.calculate_segment_size(path)?;

        let extraction = self.extract_audio_data();
        self.update_sampling_and_bit_rate();
        extraction
    }

    fn open_container(&mut self, path: &Path) -> Result<()> {
        self.container = Some(Container::open(path, &self.config)?);
        self.state = PipelineState::ContainerOpened;
        Ok(())
    }

    fn find_audio_stream(&mut self, path: &Path) -> Result<()> {
        let container = self.container.as_ref().ok_or_else(|| missing("container"))?;
        let stream = select_audio_stream(container.streams()).ok_or_else(|| {
            Error::NoAudioStream {
                path: path.to_path_buf(),
            }
        })?;

        debug!(
            "Selected stream {} (track {}, {:?} Hz, {:?} channels)",
            stream.index, stream.track_id, stream.sample_rate, stream.channels
        );
        self.stream = Some(stream);
        self.state = PipelineState::StreamSelected;
        Ok(())
    }

    fn open_codec(&mut self, path: &Path) -> Result<()> {
        let container = self.container.as_ref().ok_or_else(|| missing("container"))?;
        let stream = self.stream.as_ref().ok_or_else(|| missing("stream"))?;
        let params = container
            .stream_params(stream.index)
            .ok_or_else(|| missing("stream parameters"))?;

        self.codec = Some(CodecSession::open(path, stream, params)?);
        self.state = PipelineState::CodecOpened;
        Ok(())
    }

    fn calculate_segment_size(&mut self, path: &Path) -> Result<()> {
        let container = self.container.as_ref().ok_or_else(|| missing("container"))?;
        let stream = self.stream.as_ref().ok_or_else(|| missing("stream"))?;
        let codec = self.codec.as_ref().ok_or_else(|| missing("decoder"))?;
        let resolved = codec.resolved_params();
        let declared = container.stream_params(stream.index);

        let invalid = |reason: String| Error::InvalidFormat {
            path: path.to_path_buf(),
            reason,
        };

        let frames = resolved
            .max_frames_per_packet
            .or_else(|| declared.and_then(|p| p.max_frames_per_packet))
            .or_else(|| {
                let extra_data = resolved
                    .extra_data
                    .as_deref()
                    .or_else(|| declared.and_then(|p| p.extra_data.as_deref()));
                native_frame_size(stream.codec, extra_data)
            });
        let source_rate = resolved
            .sample_rate
            .or(stream.sample_rate)
            .filter(|&rate| rate > 0)
            .ok_or_else(|| invalid("sample rate is not known".to_string()))?;
        let source_channels = resolved
            .channels
            .map(|c| c.count())
            .or(stream.channels)
            .filter(|&count| count > 0)
            .ok_or_else(|| invalid("channel layout is not known".to_string()))?;

        let segment = SegmentSize::compute(
            frames,
            output_channels(self.config.channels, source_channels),
        )
        .map_err(invalid)?;

        let resampler = Resampler::new(
            path,
            source_rate,
            source_channels,
            self.config.channels,
            self.config.target_sample_rate,
            &segment,
        )?;

        debug!(
            "Segment size: {} frames x {} channel(s) = {} bytes",
            segment.frames(),
            segment.channels(),
            segment.bytes()
        );
        self.segment = Some(segment);
        self.resampler = Some(resampler);
        self.state = PipelineState::SegmentSized;
        Ok(())
    }

    fn extract_audio_data(&mut self) -> Result<()> {
        let Self {
            container: Some(container),
            codec: Some(codec),
            resampler: Some(resampler),
            segment: Some(segment),
            stats,
            buffer,
            state,
            ..
        } = self
        else {
            return Err(missing("decode handles"));
        };

        *state = PipelineState::Extracting;
        let mut accumulator = BufferAccumulator::with_output(segment, std::mem::take(buffer));
        let result = drive(container, codec, resampler, stats, &mut accumulator);

        debug!(
            "Extracted {} {} packets ({} frames, {} segments)",
            stats.packets(),
            codec.codec_name(),
            stats.decoded_frames(),
            accumulator.segments()
        );
        *buffer = accumulator.finish();
        result
    }

    /// Resolve final sample rate and bit rate from what was decoded.
    fn update_sampling_and_bit_rate(&mut self) {
        let (Some(codec), Some(resampler)) = (&self.codec, &self.resampler) else {
            return;
        };

        self.metadata = self.stats.finalize(
            codec.resolved_params(),
            resampler.output_rate(),
            resampler.output_channels(),
            self.buffer.len(),
        );
        if self.metadata.is_none() {
            warn!("Could not resolve sample rate and bit rate after decoding");
        }
    }

    /// Drop container, decoder and resampler.
    fn release(&mut self) {
        let resampler = self.resampler.take().is_some();
        let codec = self.codec.take().is_some();
        let container = self.container.take().is_some();
        if resampler || codec || container {
            debug!(
                "Released handles (container: {container}, decoder: {codec}, resampler: {resampler})"
            );
        }
    }

    /// Release any handles and return to [`PipelineState::Uninitialized`].
    pub fn reset(&mut self) {
        self.release();
        self.state = PipelineState::Uninitialized;
        self.path = None;
        self.stream = None;
        self.segment = None;
        self.stats = ExtractionStats::default();
        self.buffer = Vec::new();
        self.metadata = None;
    }

    /// Current pipeline state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// File processed by this session, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The selected audio stream.
    pub fn stream(&self) -> Option<&StreamDescriptor> {
        self.stream.as_ref()
    }

    /// The segment size fixed for this session.
    pub fn segment_size(&self) -> Option<SegmentSize> {
        self.segment
    }

    /// Canonical PCM bytes decoded so far.
    pub fn audio_buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Mutable access to the session buffer.
    pub fn audio_buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    /// Move the buffer out, leaving the session buffer empty.
    pub fn take_audio_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Resolved metadata, present once extraction has run.
    pub fn metadata(&self) -> Option<&AudioMetadata> {
        self.metadata.as_ref()
    }

    /// Sample rate of the buffer in Hz.
    pub fn sample_rate(&self) -> Option<u32> {
        self.metadata.map(|m| m.sample_rate)
    }

    /// Average source bit rate in bits per second.
    pub fn bit_rate(&self) -> Option<u32> {
        self.metadata.map(|m| m.bit_rate)
    }

    /// Whether the session still holds any decode handle.
    pub fn holds_handles(&self) -> bool {
        self.container.is_some() || self.codec.is_some() || self.resampler.is_some()
    }
}

/// Packet loop: demux, decode, convert, append.
fn drive(
    container: &mut Container,
    codec: &mut CodecSession,
    resampler: &mut Resampler,
    stats: &mut ExtractionStats,
    accumulator: &mut BufferAccumulator,
) -> Result<()> {
    while let Some(packet) = container.next_packet()? {
        if !codec.accepts(&packet) {
            continue;
        }

        stats.record_packet(packet.buf().len());
        let frame = codec.decode(&packet)?;
        stats.record_frame(frame.frames(), frame.spec().rate);
        accumulator.append(resampler.convert(frame)?);
    }

    codec.flush();
    accumulator.append(resampler.flush()?);
    Ok(())
}

fn missing(what: &str) -> Error {
    Error::Internal {
        message: format!("{what} not available at this pipeline stage"),
    }
}
