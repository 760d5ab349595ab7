//! Container demuxing and audio stream selection using symphonia.

use crate::config::DecodeConfig;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::codecs::{CODEC_TYPE_NULL, CodecParameters, CodecType};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, Track};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// An open audio container.
pub struct Container {
    reader: Box<dyn FormatReader>,
    path: PathBuf,
}

impl Container {
    /// Open and probe a container file.
    ///
    /// The file extension is used as a probe hint; the content decides.
    pub fn open(path: &Path, config: &DecodeConfig) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::Open {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let format_opts = FormatOptions {
            enable_gapless: config.gapless,
            ..FormatOptions::default()
        };

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &MetadataOptions::default())
            .map_err(|e| Error::Open {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

        debug!(
            "Opened container {} with {} stream(s)",
            path.display(),
            probed.format.tracks().len()
        );

        Ok(Self {
            reader: probed.format,
            path: path.to_path_buf(),
        })
    }

    /// Elementary streams in the container.
    pub fn streams(&self) -> &[Track] {
        self.reader.tracks()
    }

    /// Declared codec parameters of the stream at `index`.
    pub fn stream_params(&self, index: usize) -> Option<&CodecParameters> {
        self.reader.tracks().get(index).map(|t| &t.codec_params)
    }

    /// Read the next packet.
    ///
    /// Returns `Ok(None)` at end of input.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        match self.reader.next_packet() {
            Ok(packet) => Ok(Some(packet)),
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Ok(None)
            }
            Err(SymphoniaError::ResetRequired) => {
                warn!(
                    "Stream layout changed in {}, stopping at current position",
                    self.path.display()
                );
                Ok(None)
            }
            Err(e) => Err(Error::Decode {
                path: self.path.clone(),
                source: Box::new(e),
            }),
        }
    }
}

/// The audio stream chosen for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Position of the stream in the container's stream list.
    pub index: usize,
    /// Track id carried by the stream's packets.
    pub track_id: u32,
    /// Codec identifier.
    pub codec: CodecType,
    /// Declared sample rate, if the container states one.
    pub sample_rate: Option<u32>,
    /// Declared channel count, if the container states one.
    pub channels: Option<usize>,
}

/// Select the first audio stream.
///
/// A stream counts as audio when its codec is not the null codec.
pub fn select_audio_stream(streams: &[Track]) -> Option<StreamDescriptor> {
    streams
        .iter()
        .enumerate()
        .find(|(_, t)| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|(index, track)| StreamDescriptor {
            index,
            track_id: track.id,
            codec: track.codec_params.codec,
            sample_rate: track.codec_params.sample_rate,
            channels: track.codec_params.channels.map(|c| c.count()),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use symphonia::core::audio::Channels;
    use symphonia::core::codecs::{CODEC_TYPE_FLAC, CODEC_TYPE_PCM_S16LE};

    fn null_track(id: u32) -> Track {
        Track::new(id, CodecParameters::new())
    }

    fn audio_track(id: u32, codec: CodecType) -> Track {
        let mut params = CodecParameters::new();
        params
            .for_codec(codec)
            .with_sample_rate(44_100)
            .with_channels(Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        Track::new(id, params)
    }

    #[test]
    fn test_select_first_audio_stream() {
        let streams = vec![
            null_track(1),
            audio_track(2, CODEC_TYPE_FLAC),
            audio_track(3, CODEC_TYPE_PCM_S16LE),
        ];
        let stream = select_audio_stream(&streams).unwrap();
        assert_eq!(stream.index, 1);
        assert_eq!(stream.track_id, 2);
        assert_eq!(stream.codec, CODEC_TYPE_FLAC);
        assert_eq!(stream.sample_rate, Some(44_100));
        assert_eq!(stream.channels, Some(2));
    }

    #[test]
    fn test_select_without_audio_stream() {
        assert!(select_audio_stream(&[null_track(1), null_track(2)]).is_none());
        assert!(select_audio_stream(&[]).is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let result = Container::open(Path::new("/nonexistent/input.wav"), &DecodeConfig::default());
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_open_unrecognised_container() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"definitely not a RIFF header").unwrap();

        let result = Container::open(file.path(), &DecodeConfig::default());
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}
