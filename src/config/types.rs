//! Configuration type definitions.

use crate::constants::DEFAULT_MP3_BIT_RATE;
use serde::{Deserialize, Serialize};

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decode settings.
    #[serde(default)]
    pub decode: DecodeConfig,

    /// Encode settings.
    #[serde(default)]
    pub encode: EncodeConfig,
}

/// Settings for the decode pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Output sample rate in Hz; `None` keeps the source rate.
    pub target_sample_rate: Option<u32>,

    /// Output channel layout.
    pub channels: ChannelMode,

    /// Trim encoder delay and padding when the container describes them.
    pub gapless: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: None,
            channels: ChannelMode::Preserve,
            gapless: true,
        }
    }
}

/// Settings for MP3 encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Bit rate in bits per second.
    pub bit_rate: u32,

    /// Encoder quality preset.
    pub quality: EncodeQuality,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            bit_rate: DEFAULT_MP3_BIT_RATE,
            quality: EncodeQuality::Standard,
        }
    }
}

/// Channel layout of the canonical buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Keep the source channel count.
    #[default]
    Preserve,
    /// Average all channels into one.
    Mono,
}

impl std::fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preserve => write!(f, "preserve"),
            Self::Mono => write!(f, "mono"),
        }
    }
}

impl std::str::FromStr for ChannelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" | "source" => Ok(Self::Preserve),
            "mono" => Ok(Self::Mono),
            other => Err(format!("unknown channel mode: {other}")),
        }
    }
}

/// MP3 encoder quality preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeQuality {
    /// Slowest, best psychoacoustic quality.
    High,
    /// Balanced default.
    #[default]
    Standard,
    /// Fastest encoding.
    Fast,
}

impl std::fmt::Display for EncodeQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Standard => write!(f, "standard"),
            Self::Fast => write!(f, "fast"),
        }
    }
}

impl std::str::FromStr for EncodeQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "best" => Ok(Self::High),
            "standard" => Ok(Self::Standard),
            "fast" => Ok(Self::Fast),
            other => Err(format!("unknown encode quality: {other}")),
        }
    }
}
