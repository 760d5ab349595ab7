//! Error types for pcmflow.

use std::path::PathBuf;

/// Result type alias for pcmflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for pcmflow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to open or probe the audio container.
    #[error("failed to open audio file '{path}'")]
    Open {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The container has no audio stream.
    #[error("no audio stream found in '{path}'")]
    NoAudioStream {
        /// Path to the audio file.
        path: PathBuf,
    },

    /// No decoder is registered for the stream's codec.
    #[error("unsupported codec {codec} in '{path}'")]
    UnsupportedCodec {
        /// Path to the audio file.
        path: PathBuf,
        /// Codec identifier as reported by the demuxer.
        codec: String,
    },

    /// The decoder exists but could not be opened.
    #[error("failed to open decoder for '{path}'")]
    CodecOpen {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Stream parameters do not allow a positive segment size.
    #[error("invalid stream format in '{path}': {reason}")]
    InvalidFormat {
        /// Path to the audio file.
        path: PathBuf,
        /// Description of the missing or invalid parameter.
        reason: String,
    },

    /// Demuxing, decoding or resampling failed mid-stream.
    #[error("failed to decode audio from '{path}'")]
    Decode {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Encoding a PCM buffer failed or the request was rejected.
    #[error("failed to encode '{path}': {reason}")]
    Encode {
        /// Destination path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The session already processed a file and must be reset first.
    #[error("session already used for '{path}', reset it before processing another file")]
    SessionInUse {
        /// File processed by the previous run.
        path: PathBuf,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write WAV file.
    #[error("failed to write WAV file '{path}'")]
    WavWriteFailed {
        /// Path to the WAV file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: hound::Error,
    },

    /// Failed to serialize metadata as JSON.
    #[error("failed to write JSON output")]
    JsonWrite {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether bytes decoded before this error are kept in the session buffer.
    pub fn preserves_partial_output(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_decode_errors_preserve_partial_output() {
        let path = PathBuf::from("in.flac");
        let decode = Error::Decode {
            path: path.clone(),
            source: "corrupt frame".into(),
        };
        let no_stream = Error::NoAudioStream { path };
        assert!(decode.preserves_partial_output());
        assert!(!no_stream.preserves_partial_output());
    }

    #[test]
    fn test_error_messages_name_the_file() {
        let err = Error::UnsupportedCodec {
            path: PathBuf::from("clip.xyz"),
            codec: "0x1234".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported codec 0x1234 in 'clip.xyz'");
    }
}
