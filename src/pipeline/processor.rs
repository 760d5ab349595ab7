//! Single file processing pipeline.

use crate::audio::{AudioMetadata, EncodeRequest, save_as_mp3, write_wav};
use crate::config::{DecodeConfig, EncodeConfig};
use crate::error::{Error, Result};
use crate::pipeline::PipelineSession;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to do with the decoded buffer.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Decode only.
    None,
    /// Write a 16-bit WAV file.
    Wav(PathBuf),
    /// Encode to MP3.
    Mp3 {
        /// Destination path.
        path: PathBuf,
        /// Encoder settings.
        encode: EncodeConfig,
    },
}

/// Outcome of processing one file.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Resolved stream metadata.
    pub metadata: AudioMetadata,
    /// Bytes in the canonical buffer.
    pub buffer_bytes: usize,
    /// Wall time spent decoding and writing.
    pub duration_secs: f64,
}

/// Decode `input_path` and write the buffer to `target`.
///
/// When decoding fails mid-stream the bytes decoded so far are still
/// written before the error is returned.
pub fn process_file(
    input_path: &Path,
    decode: &DecodeConfig,
    target: &OutputTarget,
) -> Result<ProcessResult> {
    use std::time::Instant;

    let start_time = Instant::now();

    let mut session = PipelineSession::new(decode.clone());
    let partial = match session.process_audio_file(input_path) {
        Ok(()) => None,
        Err(e) if e.preserves_partial_output() && !session.audio_buffer().is_empty() => {
            warn!(
                "Keeping {} bytes decoded before the failure",
                session.audio_buffer().len()
            );
            Some(e)
        }
        Err(e) => return Err(e),
    };

    let Some(metadata) = session.metadata().copied() else {
        return Err(unresolved_metadata(input_path, partial));
    };

    write_output(session.audio_buffer(), &metadata, target)?;
    if let Some(e) = partial {
        return Err(e);
    }

    let duration_secs = start_time.elapsed().as_secs_f64();
    info!(
        "Processed {} in {:.2}s ({:.1}x realtime)",
        input_path.display(),
        duration_secs,
        realtime_factor(metadata.duration_secs(), duration_secs)
    );

    Ok(ProcessResult {
        metadata,
        buffer_bytes: session.audio_buffer().len(),
        duration_secs,
    })
}

fn write_output(pcm: &[u8], metadata: &AudioMetadata, target: &OutputTarget) -> Result<()> {
    match target {
        OutputTarget::None => Ok(()),
        OutputTarget::Wav(path) => {
            info!("Writing WAV: {}", path.display());
            write_wav(path, pcm, metadata.sample_rate, metadata.channels)
        }
        OutputTarget::Mp3 { path, encode } => {
            info!("Writing MP3: {}", path.display());
            let request = EncodeRequest::new(pcm, path.clone(), metadata.sample_rate)
                .bit_rate(encode.bit_rate)
                .channels(metadata.channels)
                .quality(encode.quality);
            save_as_mp3(&request)
        }
    }
}

/// Error for a run that ended without metadata; a decode failure wins.
fn unresolved_metadata(input_path: &Path, partial: Option<Error>) -> Error {
    partial.unwrap_or_else(|| Error::InvalidFormat {
        path: input_path.to_path_buf(),
        reason: "sample rate and bit rate could not be resolved".to_string(),
    })
}

fn realtime_factor(audio_secs: f64, wall_secs: f64) -> f64 {
    if wall_secs > 0.0 {
        audio_secs / wall_secs
    } else {
        0.0
    }
}
