//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "pcmflow";

/// Byte width of one canonical sample (signed 16-bit little-endian).
pub const CANONICAL_SAMPLE_WIDTH: usize = 2;

/// Default channel count for encode requests.
pub const DEFAULT_CHANNELS: u16 = 1;

/// Default MP3 bit rate in bits per second.
pub const DEFAULT_MP3_BIT_RATE: u32 = 128_000;

/// Samples per channel in one MPEG-1 Layer III frame.
pub const MP3_FRAME_SIZE: usize = 1152;

/// Largest channel count the MP3 encoder accepts.
pub const MP3_MAX_CHANNELS: u16 = 2;

/// Bit rates (bits per second) supported by MPEG-1 Layer III encoding,
/// ascending.
pub const MP3_BIT_RATES: [u32; 16] = [
    8_000, 16_000, 24_000, 32_000, 40_000, 48_000, 64_000, 80_000, 96_000, 112_000, 128_000,
    160_000, 192_000, 224_000, 256_000, 320_000,
];

/// Sub-chunks used by the FFT resampler.
pub const RESAMPLER_SUB_CHUNKS: usize = 1;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable that points at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "PCMFLOW_CONFIG";
