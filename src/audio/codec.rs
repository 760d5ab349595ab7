//! Decoder session bound to the selected audio stream.

use crate::audio::StreamDescriptor;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use symphonia::core::audio::AudioBufferRef;
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::Packet;
use tracing::{debug, warn};

/// An open decoder for one stream.
pub struct CodecSession {
    decoder: Box<dyn Decoder>,
    track_id: u32,
    codec_name: &'static str,
    path: PathBuf,
}

impl CodecSession {
    /// Open a decoder for `stream` using its declared parameters.
    pub fn open(path: &Path, stream: &StreamDescriptor, params: &CodecParameters) -> Result<Self> {
        let registry = symphonia::default::get_codecs();

        let descriptor = registry
            .get_codec(params.codec)
            .ok_or_else(|| Error::UnsupportedCodec {
                path: path.to_path_buf(),
                codec: format!("{:?}", params.codec),
            })?;

        let decoder = registry
            .make(params, &DecoderOptions { verify: true })
            .map_err(|e| Error::CodecOpen {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

        debug!(
            "Opened {} decoder for stream {} (track {})",
            descriptor.short_name, stream.index, stream.track_id
        );

        Ok(Self {
            decoder,
            track_id: stream.track_id,
            codec_name: descriptor.short_name,
            path: path.to_path_buf(),
        })
    }

    /// Short name of the codec, e.g. `"mp3"`.
    pub fn codec_name(&self) -> &'static str {
        self.codec_name
    }

    /// Whether `packet` belongs to this decoder's stream.
    pub fn accepts(&self, packet: &Packet) -> bool {
        packet.track_id() == self.track_id
    }

    /// Decode one packet into a frame.
    pub fn decode(&mut self, packet: &Packet) -> Result<AudioBufferRef<'_>> {
        self.decoder.decode(packet).map_err(|e| Error::Decode {
            path: self.path.clone(),
            source: Box::new(e),
        })
    }

    /// Finalize the decoder after end of input.
    ///
    /// Symphonia decoders emit every frame synchronously, so there is no
    /// buffered audio left to drain; this only reports the integrity check.
    pub fn flush(&mut self) {
        let result = self.decoder.finalize();
        if result.verify_ok == Some(false) {
            warn!(
                "Decoded audio failed the {} integrity check: {}",
                self.codec_name,
                self.path.display()
            );
        }
    }

    /// Parameters as resolved by the decoder.
    pub fn resolved_params(&self) -> &CodecParameters {
        self.decoder.codec_params()
    }
}
