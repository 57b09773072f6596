//! Building an authenticator from layered configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use latchkey_auth::{AuthSettings, Authenticator, FreshnessPolicy, SubjectId, client};
use latchkey_config::{ConfigError, loader::load_layers};
use latchkey_crypto::{Macaroon, RootKey};
use latchkey_storage::{MemoryStore, NonceStore};

fn authenticator_from(config: &latchkey_config::Config) -> Authenticator {
    let key = RootKey::from_hex(config.auth.root_key.as_deref().expect("root key configured"))
        .expect("validated key should parse");
    let settings = AuthSettings::new(config.auth.location.clone()).with_freshness(FreshnessPolicy {
        lifetime: config.auth.lifetime(),
        clock_skew: config.auth.clock_skew(),
    });
    let store = Arc::new(MemoryStore::new(config.nonce_retention()));
    Authenticator::new(settings, key, store).expect("validated retention should suffice")
}

#[test]
fn test_file_and_env_layers_drive_authenticator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latchkey.toml");
    std::fs::write(&path, "[auth]\nlocation = \"api.example\"\nlifetime_ms = 2000\n").unwrap();

    let key = RootKey::generate();
    let env = HashMap::from([("LATCHKEY_ROOT_KEY".to_owned(), key.to_hex().to_string())]);
    let resolved = load_layers(None, Some(&path), &env).unwrap();
    assert_eq!(resolved.loaded_files.len(), 1);

    let config = resolved.config;
    assert_eq!(config.nonce_retention(), Duration::from_secs(3));

    let auth = authenticator_from(&config);
    assert_eq!(auth.nonce_store().retention(), Duration::from_secs(3));

    let token = auth.issue(SubjectId(100), None).unwrap();
    assert_eq!(Macaroon::from_hex(&token).unwrap().location(), "api.example");

    let request = client::prepare_request(&token, 1).unwrap();
    assert_eq!(auth.verify(&request).unwrap().subject_id(), SubjectId(100));
}

#[test]
fn test_short_retention_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latchkey.toml");
    std::fs::write(&path, "[nonces]\nretention_ms = 10\n").unwrap();

    let result = load_layers(None, Some(&path), &HashMap::new());
    assert!(matches!(
        result,
        Err(ConfigError::ValidationError { field, .. }) if field == "nonces.retention_ms"
    ));
}
