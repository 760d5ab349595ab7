//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

/// Parse and validate a bounded integer value.
///
/// # Arguments
///
/// * `s` - The string to parse
/// * `min` - Minimum allowed value (inclusive)
/// * `max` - Maximum allowed value (inclusive)
/// * `name` - Name of the parameter for error messages
pub fn parse_bounded_u32(s: &str, min: u32, max: u32, name: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid whole number"))?;

    if !(min..=max).contains(&value) {
        return Err(format!("{name} must be between {min} and {max}, got {value}"));
    }

    Ok(value)
}

/// Parse and validate an output sample rate in Hz.
pub fn parse_sample_rate(s: &str) -> Result<u32, String> {
    parse_bounded_u32(s, 1_000, 384_000, "sample rate")
}

/// Parse and validate an MP3 bit rate in bits per second.
pub fn parse_bit_rate(s: &str) -> Result<u32, String> {
    parse_bounded_u32(s, 8_000, 320_000, "bit rate")
}
