//! Configuration validation.

use crate::config::{Config, PackConfig, SegmentConfig};
use crate::constants::MAX_JOBS;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_pack_config(&config.pack)?;
    validate_segment_config(&config.segment)?;
    Ok(())
}

/// Validate packing settings.
pub fn validate_pack_config(pack: &PackConfig) -> Result<()> {
    if !pack.max_duration.is_finite() || pack.max_duration <= 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "max_duration must be a positive number of seconds, got {}",
                pack.max_duration
            ),
        });
    }

    if pack.part_prefix.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: "part_prefix must not be empty".to_string(),
        });
    }

    if pack.part_prefix.contains(['/', '\\']) {
        return Err(Error::ConfigValidation {
            message: format!(
                "part_prefix must be a plain file name, got '{}'",
                pack.part_prefix
            ),
        });
    }

    if pack.extensions.iter().all(|ext| ext.trim().is_empty()) {
        return Err(Error::ConfigValidation {
            message: "at least one audio extension must be configured".to_string(),
        });
    }

    if pack.fallback_sample_rate == 0 {
        return Err(Error::ConfigValidation {
            message: "fallback_sample_rate must be greater than zero".to_string(),
        });
    }

    validate_file_name("ledger_file", &pack.ledger_file)?;
    validate_file_name("listing_file", &pack.listing_file)?;

    Ok(())
}

/// Validate re-segmentation settings.
pub fn validate_segment_config(segment: &SegmentConfig) -> Result<()> {
    if !(1..=MAX_JOBS).contains(&segment.jobs) {
        return Err(Error::ConfigValidation {
            message: format!("jobs must be between 1 and {MAX_JOBS}, got {}", segment.jobs),
        });
    }
    Ok(())
}

fn validate_file_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ConfigValidation {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}
