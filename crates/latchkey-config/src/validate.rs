//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Shortest accepted root key in bytes.
const MIN_ROOT_KEY_BYTES: usize = 32;
/// Longest accepted root key in bytes.
const MAX_ROOT_KEY_BYTES: usize = 64;
/// Longest accepted location hint in bytes.
const MAX_LOCATION_BYTES: usize = 256;

/// Log levels accepted in `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
/// Formats accepted in `logging.format`.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_auth(config)?;
    validate_nonces(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_auth(config: &Config) -> ConfigResult<()> {
    let a = &config.auth;

    if a.location.is_empty() || a.location.len() > MAX_LOCATION_BYTES {
        return Err(invalid(
            "auth.location",
            format!("location must be 1 to {MAX_LOCATION_BYTES} bytes"),
        ));
    }

    if a.lifetime_ms == 0 {
        return Err(invalid("auth.lifetime_ms", "lifetime_ms must be positive"));
    }

    if let Some(key) = &a.root_key {
        if a.root_key_file.is_some() {
            return Err(invalid(
                "auth.root_key",
                "set either root_key or root_key_file, not both",
            ));
        }
        let bytes = hex::decode(key.trim())
            .map_err(|_| invalid("auth.root_key", "root_key must be hex encoded"))?;
        if !(MIN_ROOT_KEY_BYTES..=MAX_ROOT_KEY_BYTES).contains(&bytes.len()) {
            return Err(invalid(
                "auth.root_key",
                format!(
                    "root_key is {} bytes; must be {MIN_ROOT_KEY_BYTES} to {MAX_ROOT_KEY_BYTES}",
                    bytes.len()
                ),
            ));
        }
    }

    Ok(())
}

fn validate_nonces(config: &Config) -> ConfigResult<()> {
    let n = &config.nonces;

    if n.sweep_interval_ms == 0 {
        return Err(invalid(
            "nonces.sweep_interval_ms",
            "sweep_interval_ms must be positive",
        ));
    }

    let window = config
        .auth
        .lifetime_ms
        .saturating_add(config.auth.clock_skew_ms);
    if n.retention_ms != 0 && n.retention_ms < window {
        return Err(invalid(
            "nonces.retention_ms",
            format!(
                "retention_ms ({}) must cover lifetime_ms + clock_skew_ms ({window}); \
                 a shorter retention lets fresh requests be replayed",
                n.retention_ms
            ),
        ));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !LOG_LEVELS.contains(&l.level.to_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                l.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if !LOG_FORMATS.contains(&l.format.to_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        validate(&Config::default()).unwrap();
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let mut config = Config::default();
        config.auth.lifetime_ms = 0;
        assert_eq!(field_of(validate(&config)), "auth.lifetime_ms");
    }

    #[test]
    fn test_empty_location_rejected() {
        let mut config = Config::default();
        config.auth.location = String::new();
        assert_eq!(field_of(validate(&config)), "auth.location");
    }

    #[test]
    fn test_root_key_checked() {
        let mut config = Config::default();
        config.auth.root_key = Some("zz".into());
        assert_eq!(field_of(validate(&config)), "auth.root_key");

        config.auth.root_key = Some("ab".repeat(16));
        assert_eq!(field_of(validate(&config)), "auth.root_key");

        config.auth.root_key = Some("ab".repeat(32));
        validate(&config).unwrap();

        config.auth.root_key_file = Some(PathBuf::from("/tmp/key"));
        assert_eq!(field_of(validate(&config)), "auth.root_key");
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let mut config = Config::default();
        config.nonces.sweep_interval_ms = 0;
        assert_eq!(field_of(validate(&config)), "nonces.sweep_interval_ms");
    }

    #[test]
    fn test_short_retention_rejected() {
        let mut config = Config::default();
        config.nonces.retention_ms = 5999;
        assert_eq!(field_of(validate(&config)), "nonces.retention_ms");

        config.nonces.retention_ms = 6000;
        validate(&config).unwrap();
    }

    #[test]
    fn test_unknown_logging_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".into();
        assert_eq!(field_of(validate(&config)), "logging.level");

        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert_eq!(field_of(validate(&config)), "logging.format");

        let mut config = Config::default();
        config.logging.level = "DEBUG".into();
        validate(&config).unwrap();
    }
}
