//! CLI argument definitions.

use crate::cli::validators::{parse_bit_rate, parse_sample_rate};
use crate::config::{ChannelMode, DecodeConfig, EncodeConfig, EncodeQuality};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Decode audio files to canonical 16-bit PCM and re-encode them as MP3.
#[derive(Debug, Parser)]
#[command(name = "pcmflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress informational output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output sample rate in Hz (default: keep the source rate).
    #[arg(long, global = true, value_parser = parse_sample_rate)]
    pub target_rate: Option<u32>,

    /// Downmix to a single channel.
    #[arg(long, global = true)]
    pub mono: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the configured decode settings.
    pub fn decode_config(&self, base: &DecodeConfig) -> DecodeConfig {
        let mut config = base.clone();
        if let Some(rate) = self.target_rate {
            config.target_sample_rate = Some(rate);
        }
        if self.mono {
            config.channels = ChannelMode::Mono;
        }
        config
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a file and print its stream metadata.
    Inspect {
        /// Input audio file.
        input: PathBuf,
        /// Print metadata as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Decode a file and write the canonical buffer as WAV.
    Decode {
        /// Input audio file.
        input: PathBuf,
        /// Output WAV path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Decode a file and re-encode it as MP3.
    Transcode {
        /// Input audio file.
        input: PathBuf,
        /// Output MP3 path.
        #[arg(short, long)]
        output: PathBuf,
        /// Bit rate in bits per second (default from config).
        #[arg(short, long, value_parser = parse_bit_rate)]
        bit_rate: Option<u32>,
        /// Encoder quality preset (high, standard, fast).
        #[arg(long)]
        quality: Option<EncodeQuality>,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Command {
    /// Encoder settings for `transcode`, with command-line overrides applied.
    pub fn encode_config(
        bit_rate: Option<u32>,
        quality: Option<EncodeQuality>,
        base: &EncodeConfig,
    ) -> EncodeConfig {
        EncodeConfig {
            bit_rate: bit_rate.unwrap_or(base.bit_rate),
            quality: quality.unwrap_or(base.quality),
        }
    }
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}
