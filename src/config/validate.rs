//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.decode.target_sample_rate == Some(0) {
        return Err(Error::ConfigValidation {
            message: "decode.target_sample_rate must be greater than 0".to_string(),
        });
    }

    if config.encode.bit_rate == 0 {
        return Err(Error::ConfigValidation {
            message: "encode.bit_rate must be greater than 0".to_string(),
        });
    }

    Ok(())
}
