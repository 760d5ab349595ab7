//! Integration tests for the pcmflow binary.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_tone(path: &Path, sample_rate: u32, frames: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let s = ((i as f32 * 0.05).sin() * 8_000.0) as i16;
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Command with an isolated config directory.
fn pcmflow(config_home: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("pcmflow"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG")
        .env_remove("PCMFLOW_CONFIG");
    cmd
}

#[test]
fn test_inspect_json() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    write_tone(&input, 16_000, 16_000);

    let output = pcmflow(dir.path())
        .arg("inspect")
        .arg(&input)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["sample_rate"], 16_000);
    assert_eq!(value["bit_rate"], 256_000);
    assert_eq!(value["channels"], 1);
    assert_eq!(value["frames"], 16_000);
}

#[test]
fn test_inspect_text() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    write_tone(&input, 8_000, 4_000);

    pcmflow(dir.path())
        .arg("inspect")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample rate:   8000 Hz"))
        .stdout(predicate::str::contains("Duration:      0.500s"));
}

#[test]
fn test_decode_with_target_rate() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("out.wav");
    write_tone(&input, 16_000, 16_000);

    pcmflow(dir.path())
        .args(["-q", "decode"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--target-rate", "8000"])
        .assert()
        .success();

    let reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().sample_rate, 8_000);
    assert!(u64::from(reader.duration()).abs_diff(8_000) <= 2);
}

#[test]
fn test_transcode_writes_mp3() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("out.mp3");
    write_tone(&input, 44_100, 44_100);

    pcmflow(dir.path())
        .arg("transcode")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--bit-rate", "96000"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Processing:"));

    assert!(std::fs::metadata(&output).unwrap().len() > 0);
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    pcmflow(dir.path())
        .arg("inspect")
        .arg(dir.path().join("missing.flac"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: failed to open audio file"));
}

#[test]
fn test_invalid_bit_rate_rejected() {
    let dir = TempDir::new().unwrap();

    pcmflow(dir.path())
        .args(["transcode", "in.wav", "-o", "out.mp3", "--bit-rate", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bit rate must be between"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();

    pcmflow(dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    pcmflow(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[decode]"))
        .stdout(predicate::str::contains("bit_rate = 128000"));
}

#[test]
fn test_explicit_config_file_applies() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    let config = dir.path().join("custom.toml");
    write_tone(&input, 16_000, 16_000);
    std::fs::write(&config, "[decode]\ntarget_sample_rate = 8000\n").unwrap();

    let output = pcmflow(dir.path())
        .env("PCMFLOW_CONFIG", &config)
        .args(["inspect", "--json"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["sample_rate"], 8_000);
    assert_eq!(value["source_sample_rate"], 16_000);
}
