//! Bridge from `latchkey_config::Config` to domain types.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use latchkey_auth::{AuthSettings, Authenticator, FreshnessPolicy};
use latchkey_config::Config;
use latchkey_crypto::RootKey;
use latchkey_storage::MemoryStore;
use latchkey_telemetry::{LogConfig, LogFormat};

/// Logging setup from the `[logging]` section, with `--verbose` forcing debug.
pub(crate) fn to_log_config(config: &Config, verbose: bool) -> LogConfig {
    let mut log_config = LogConfig::try_from(&config.logging)
        .unwrap_or_else(|_| LogConfig::new("info").with_format(LogFormat::Compact));
    if verbose {
        "debug".clone_into(&mut log_config.level);
    }
    log_config
}

/// Authenticator settings from the `[auth]` section.
pub(crate) fn to_auth_settings(config: &Config) -> AuthSettings {
    AuthSettings::new(config.auth.location.clone()).with_freshness(FreshnessPolicy {
        lifetime: config.auth.lifetime(),
        clock_skew: config.auth.clock_skew(),
    })
}

/// Default location of the root key file.
pub(crate) fn default_root_key_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "latchkey").map(|d| d.data_dir().join("root.key"))
}

/// Resolve the root key: inline hex, then the configured file, then the
/// default key file. Key files are created on first use.
pub(crate) fn load_root_key(config: &Config) -> anyhow::Result<RootKey> {
    if let Some(hex) = &config.auth.root_key {
        return RootKey::from_hex(hex).context("invalid auth.root_key");
    }

    let path = match &config.auth.root_key_file {
        Some(path) => path.clone(),
        None => default_root_key_path()
            .context("no root key configured and no data directory available")?,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    RootKey::load_or_generate(&path)
        .with_context(|| format!("failed to load root key from {}", path.display()))
}

/// Authenticator recording nonces into `store`.
pub(crate) fn build_authenticator(
    config: &Config,
    store: Arc<MemoryStore>,
) -> anyhow::Result<Authenticator> {
    let root_key = load_root_key(config)?;
    tracing::debug!(fingerprint = %root_key.fingerprint(), "root key loaded");
    Ok(Authenticator::new(to_auth_settings(config), root_key, store)?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_auth_settings_follow_config() {
        let mut config = Config::default();
        config.auth.location = "api".into();
        config.auth.lifetime_ms = 2500;

        let settings = to_auth_settings(&config);
        assert_eq!(settings.location, "api");
        assert_eq!(settings.freshness.lifetime, Duration::from_millis(2500));
        assert_eq!(settings.freshness.clock_skew, Duration::from_secs(1));
    }

    #[test]
    fn test_verbose_forces_debug() {
        let config = Config::default();
        assert_eq!(to_log_config(&config, false).level, "info");
        assert_eq!(to_log_config(&config, true).level, "debug");
    }

    #[test]
    fn test_inline_root_key() {
        let key = RootKey::generate();
        let mut config = Config::default();
        config.auth.root_key = Some(key.to_hex().to_string());
        assert_eq!(load_root_key(&config).unwrap().fingerprint(), key.fingerprint());
    }

    #[test]
    fn test_root_key_file_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.auth.root_key_file = Some(dir.path().join("keys").join("root.key"));

        let first = load_root_key(&config).unwrap();
        let second = load_root_key(&config).unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_authenticator_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.auth.root_key_file = Some(dir.path().join("root.key"));

        let store = Arc::new(MemoryStore::new(config.nonce_retention()));
        let auth = build_authenticator(&config, store).unwrap();
        let token = auth.issue(latchkey_auth::SubjectId(9), None).unwrap();
        let request = latchkey_auth::client::prepare_request(&token, 1).unwrap();
        assert_eq!(auth.verify(&request).unwrap().subject_id().0, 9);
    }
}
