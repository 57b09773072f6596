//! Token issuer and verifier.

use std::fmt;
use std::sync::Arc;

use latchkey_crypto::{Macaroon, RootKey};
use latchkey_storage::{NonceStore, RootKeyStore};
use tracing::{debug, debug_span, trace, warn};

use crate::dictionary::{CaveatDictionary, Field, Fields};
use crate::error::{AuthError, AuthResult};
use crate::freshness::{FreshnessPolicy, check_freshness};
use crate::operations::disable_operations;
use crate::subject::SubjectId;
use crate::token::Token;

/// Default location hint written into issued macaroons.
pub const DEFAULT_LOCATION: &str = "latchkey";

/// Issuer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Location hint of issued macaroons.
    pub location: String,
    /// Freshness rules applied on verification.
    pub freshness: FreshnessPolicy,
}

impl AuthSettings {
    /// Settings with the given location and default freshness.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            freshness: FreshnessPolicy::default(),
        }
    }

    /// Replace the freshness policy.
    #[must_use]
    pub fn with_freshness(mut self, freshness: FreshnessPolicy) -> Self {
        self.freshness = freshness;
        self
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION)
    }
}

/// Issues tokens and verifies prepared requests.
///
/// Safe to share between threads; the nonce store is the only shared
/// mutable state.
pub struct Authenticator {
    settings: AuthSettings,
    root_key: RootKey,
    nonces: Arc<dyn NonceStore>,
}

impl Authenticator {
    /// Create an authenticator from an explicit root key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RetentionTooShort`] if `nonces` would forget a
    /// nonce while its token can still pass the freshness check. The store
    /// must retain nonces for at least lifetime plus clock skew.
    pub fn new(
        settings: AuthSettings,
        root_key: RootKey,
        nonces: Arc<dyn NonceStore>,
    ) -> AuthResult<Self> {
        let retention = nonces.retention();
        let window = settings.freshness.replay_window();
        if retention < window {
            warn!(
                retention_ms = retention.as_millis(),
                window_ms = window.as_millis(),
                "nonce retention shorter than replay window"
            );
            return Err(AuthError::RetentionTooShort {
                retention_ms: retention.as_millis(),
                window_ms: window.as_millis(),
            });
        }
        Ok(Self {
            settings,
            root_key,
            nonces,
        })
    }

    /// Create an authenticator with the root key held by `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if no root key can be loaded, otherwise
    /// the errors of [`Authenticator::new`].
    pub fn from_key_store(
        settings: AuthSettings,
        keys: &dyn RootKeyStore,
        nonces: Arc<dyn NonceStore>,
    ) -> AuthResult<Self> {
        let root_key = keys.get_root_key()?;
        Self::new(settings, root_key, nonces)
    }

    /// The settings in effect.
    #[must_use]
    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// The nonce store verification records into.
    #[must_use]
    pub fn nonce_store(&self) -> &Arc<dyn NonceStore> {
        &self.nonces
    }

    /// Issue a token for `subject`, optionally forbidding some operations.
    ///
    /// `Some(&[])` still writes an empty deny-list, which blocks any later
    /// attenuation of the same token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidOperation`] for an unencodable operation
    /// name.
    pub fn issue(
        &self,
        subject: SubjectId,
        disabled_operations: Option<&[&str]>,
    ) -> AuthResult<String> {
        let mut macaroon = Macaroon::new(
            &self.root_key,
            subject.to_macaroon_id(),
            self.settings.location.as_str(),
        )?;

        if let Some(ops) = disabled_operations {
            macaroon = disable_operations(&macaroon, ops)?;
        }
        CaveatDictionary::open(&mut macaroon)?.put(Field::User, &subject.to_string())?;

        debug!(%subject, caveats = macaroon.caveats().len(), "issued token");
        Ok(macaroon.to_hex()?)
    }

    /// Verify a prepared token and record its nonce.
    ///
    /// # Errors
    ///
    /// In order: [`AuthError::TokenEmpty`], [`AuthError::Decode`],
    /// [`AuthError::SignatureInvalid`], [`AuthError::LocationMismatch`],
    /// [`AuthError::InvalidSubject`],
    /// caveat parse errors, [`AuthError::SubjectMismatch`], then the
    /// freshness errors of [`check_freshness`].
    pub fn verify(&self, token: &str) -> AuthResult<Token> {
        let span = debug_span!("verify_token", location = %self.settings.location);
        let _guard = span.enter();

        match self.verify_inner(token) {
            Ok(token) => {
                trace!(subject = %token.subject_id(), "token verified");
                Ok(token)
            },
            Err(e) => {
                debug!(error = %e, "token rejected");
                Err(e)
            },
        }
    }

    fn verify_inner(&self, token: &str) -> AuthResult<Token> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::TokenEmpty);
        }

        let macaroon = Macaroon::from_hex(token).map_err(AuthError::Decode)?;
        macaroon
            .verify(&self.root_key)
            .map_err(|_| AuthError::SignatureInvalid)?;
        // The location is not covered by the signature.
        if macaroon.location() != self.settings.location {
            return Err(AuthError::LocationMismatch);
        }

        let subject = SubjectId::from_macaroon_id(macaroon.id())?;
        let fields = Fields::parse(&macaroon)?;
        if let Ok(user) = fields.get(Field::User)
            && user != subject.to_string()
        {
            return Err(AuthError::SubjectMismatch);
        }

        check_freshness(
            &macaroon,
            subject,
            self.nonces.as_ref(),
            &self.settings.freshness,
        )?;
        Ok(Token::new(subject, fields, macaroon))
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("settings", &self.settings)
            .field("root_key", &self.root_key.fingerprint())
            .field("nonces", &self.nonces.len())
            .finish()
    }
}
