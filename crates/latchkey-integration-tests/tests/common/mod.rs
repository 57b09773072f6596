//! Shared test harness for integration tests.
//!
//! Wires an [`Authenticator`] to an in-memory nonce store and offers the
//! client-side helpers a caller would use between issuance and verification.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use latchkey_auth::{
    AuthSettings, Authenticator, FreshnessPolicy, SubjectId, add_nonce, add_time, client,
};
use latchkey_crypto::{Macaroon, RootKey};
use latchkey_storage::MemoryStore;

/// An issuer and verifier sharing one nonce store.
#[allow(dead_code)]
pub struct AuthHarness {
    /// Authenticator under test.
    pub auth: Authenticator,
    /// The store the authenticator records nonces into.
    pub store: Arc<MemoryStore>,
    /// The root key, kept for building hand-made macaroons.
    pub key: RootKey,
}

#[allow(dead_code)]
impl AuthHarness {
    /// Default policy (5 s lifetime, 1 s skew) with a matching 6 s retention.
    pub fn new() -> Self {
        Self::with_policy(FreshnessPolicy::default(), Duration::from_secs(6))
    }

    /// Custom freshness policy and nonce retention.
    pub fn with_policy(policy: FreshnessPolicy, retention: Duration) -> Self {
        let key = RootKey::generate();
        let store = Arc::new(MemoryStore::new(retention));
        let auth = Authenticator::new(
            AuthSettings::default().with_freshness(policy),
            key.clone(),
            Arc::clone(&store) as Arc<dyn latchkey_storage::NonceStore>,
        )
        .expect("retention should cover the replay window");
        Self { auth, store, key }
    }

    /// Issue a token, with a deny-list when `disabled` is non-empty.
    pub fn issue(&self, subject: u32, disabled: &[&str]) -> String {
        let ops = (!disabled.is_empty()).then_some(disabled);
        self.auth
            .issue(SubjectId(subject), ops)
            .expect("failed to issue token")
    }

    /// Prepare `token` for a single request stamped now.
    pub fn prepare(&self, token: &str, nonce: i64) -> String {
        client::prepare_request(token, nonce).expect("failed to prepare token")
    }

    /// Prepare `token` for a single request stamped at `at`.
    pub fn prepare_at(&self, token: &str, nonce: i64, at: DateTime<Utc>) -> String {
        let macaroon = Macaroon::from_hex(token).expect("issued token should decode");
        let with_nonce = add_nonce(&macaroon, nonce).expect("failed to add nonce");
        add_time(&with_nonce, at)
            .expect("failed to add time")
            .to_hex()
            .expect("failed to encode token")
    }
}
