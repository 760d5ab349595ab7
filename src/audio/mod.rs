//! Audio decode and encode stages.

mod accumulator;
mod codec;
mod container;
mod encode;
mod metadata;
mod resample;
mod segment;
mod wav;

pub use accumulator::BufferAccumulator;
pub use codec::CodecSession;
pub use container::{Container, StreamDescriptor, select_audio_stream};
pub use encode::{EncodeRequest, save_as_mp3, save_pcm_as_mp3};
pub use metadata::{AudioMetadata, ExtractionStats};
pub use resample::{Resampler, output_channels};
pub use segment::{SegmentSize, native_frame_size};
pub use wav::write_wav;
