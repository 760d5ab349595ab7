//! pcmflow - audio decode and transcode pipeline.
//!
//! This crate decodes any container/codec pair Symphonia supports into one
//! canonical layout (interleaved signed 16-bit little-endian PCM), reports the
//! resolved sample rate and bit rate, and re-encodes buffers as MP3.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod pipeline;

use clap::Parser;
use cli::{Cli, Command, ConfigAction};
use config::{Config, config_file_path, load_default_config, save_default_config};
use pipeline::{OutputTarget, process_file};
use tracing::info;

pub use error::{Error, Result};

/// Main entry point for the pcmflow CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    // Load configuration
    let config = load_default_config()?;
    let decode = cli.decode_config(&config.decode);

    match cli.command {
        Command::Inspect { input, json } => {
            let result = process_file(&input, &decode, &OutputTarget::None)?;
            if json {
                let out = serde_json::to_string_pretty(&result.metadata)
                    .map_err(|e| Error::JsonWrite { source: e })?;
                println!("{out}");
            } else {
                let meta = &result.metadata;
                println!("File:          {}", input.display());
                println!("Sample rate:   {} Hz", meta.sample_rate);
                println!("Source rate:   {} Hz", meta.source_sample_rate);
                println!("Bit rate:      {} bit/s", meta.bit_rate);
                println!("Channels:      {}", meta.channels);
                println!("Frames:        {}", meta.frames);
                println!("Duration:      {:.3}s", meta.duration_secs());
                println!("Buffer:        {} bytes", result.buffer_bytes);
            }
            Ok(())
        }
        Command::Decode { input, output } => {
            let result = process_file(&input, &decode, &OutputTarget::Wav(output.clone()))?;
            info!(
                "Wrote {} ({} frames)",
                output.display(),
                result.metadata.frames
            );
            Ok(())
        }
        Command::Transcode {
            input,
            output,
            bit_rate,
            quality,
        } => {
            let encode = Command::encode_config(bit_rate, quality, &config.encode);
            let target = OutputTarget::Mp3 {
                path: output.clone(),
                encode,
            };
            let result = process_file(&input, &decode, &target)?;
            info!(
                "Transcoded {} to {} ({:.2}s of audio)",
                input.display(),
                output.display(),
                result.metadata.duration_secs()
            );
            Ok(())
        }
        Command::Config { action } => handle_config_command(action, &config),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // Symphonia logs per-packet detail at debug; keep it down unless -vv.
    let filter_str = if quiet {
        "warn".to_string()
    } else {
        match verbose {
            0 => "info,symphonia=warn".to_string(),
            1 => "debug,symphonia=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_writer(std::io::stderr).with_env_filter(filter).init();
}

fn handle_config_command(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let text = toml::to_string_pretty(config)
                .map_err(|e| Error::ConfigSerialize { source: e })?;
            print!("{text}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
