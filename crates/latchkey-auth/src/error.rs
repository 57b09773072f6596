//! Authentication error types.

use latchkey_crypto::CryptoError;
use latchkey_storage::StorageError;
use thiserror::Error;

use crate::dictionary::Field;

/// Message handed to clients for any rejected token.
pub const PUBLIC_INVALID_TOKEN: &str = "invalid token";

/// Errors raised while issuing, preparing or verifying macaroons.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required caveat is absent.
    #[error("unable to find field: {0}")]
    FieldNotFound(Field),

    /// A caveat with this key is already present.
    #[error("field already exists: {0}")]
    FieldExists(Field),

    /// The macaroon carries the same key twice.
    #[error("repeated field: {0}")]
    RepeatedField(Field),

    /// A caveat does not parse as `key value`, or its value is unusable.
    #[error("malformed caveat: {0}")]
    MalformedCaveat(String),

    /// The `time` caveat is older than the freshness lifetime.
    #[error("macaroon expired")]
    MacaroonExpired,

    /// The `time` caveat lies further in the future than the clock skew allows.
    #[error("macaroon timestamp is in the future")]
    TimestampInFuture,

    /// The `(subject, nonce)` pair was presented before.
    #[error("nonce is used already")]
    NonceRepeated,

    /// The token forbids this operation.
    #[error("operation not allowed: {0}")]
    OperationNotAllowed(String),

    /// An operation name cannot be encoded in a `disops` caveat.
    #[error("invalid operation name: {0:?}")]
    InvalidOperation(String),

    /// No token was presented.
    #[error("token not found")]
    TokenEmpty,

    /// The token is not a valid macaroon encoding.
    #[error("unable to decode macaroon: {0}")]
    Decode(#[source] CryptoError),

    /// The signature chain does not verify under the root key.
    #[error("macaroon signature is invalid")]
    SignatureInvalid,

    /// The macaroon id is not a four byte subject id.
    #[error("macaroon id is not a subject id")]
    InvalidSubject,

    /// The macaroon was issued for another location.
    #[error("macaroon location does not match")]
    LocationMismatch,

    /// The `user` caveat names a different subject than the id.
    #[error("user caveat does not match macaroon id")]
    SubjectMismatch,

    /// Caveat or macaroon construction exceeded a size limit.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The nonce store forgets nonces before their tokens go stale, so a
    /// replay inside the window would be accepted.
    #[error(
        "nonce retention {retention_ms}ms is shorter than the replay window {window_ms}ms"
    )]
    RetentionTooShort {
        /// Retention of the nonce store.
        retention_ms: u128,
        /// Lifetime plus clock skew of the freshness policy.
        window_ms: u128,
    },

    /// Nonce or root key store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Whether this error means the presented token must be rejected.
    ///
    /// `false` for storage failures and misconfiguration, which say nothing
    /// about the token.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::RetentionTooShort { .. })
    }

    /// Message safe to return to the client.
    ///
    /// Verification failures collapse to one string so that a caller cannot
    /// tell a bad signature from a replayed nonce. Only a refused operation
    /// is reported as such.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::OperationNotAllowed(_) => "operation not allowed",
            Self::Storage(_) | Self::RetentionTooShort { .. } => "internal error",
            _ => PUBLIC_INVALID_TOKEN,
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_is_opaque() {
        let errors = [
            AuthError::SignatureInvalid,
            AuthError::NonceRepeated,
            AuthError::MacaroonExpired,
            AuthError::FieldNotFound(Field::Nonce),
            AuthError::Decode(CryptoError::InvalidHexEncoding),
            AuthError::LocationMismatch,
        ];
        for e in &errors {
            assert_eq!(e.public_message(), PUBLIC_INVALID_TOKEN);
            assert!(e.is_rejection());
        }
    }

    #[test]
    fn test_operation_not_allowed_is_distinguishable() {
        let e = AuthError::OperationNotAllowed("delete".into());
        assert_eq!(e.public_message(), "operation not allowed");
        assert_eq!(e.to_string(), "operation not allowed: delete");
    }

    #[test]
    fn test_storage_is_not_rejection() {
        let e = AuthError::Storage(StorageError::Internal("poisoned".into()));
        assert!(!e.is_rejection());
        assert_eq!(e.public_message(), "internal error");
    }

    #[test]
    fn test_retention_too_short_is_internal() {
        let e = AuthError::RetentionTooShort {
            retention_ms: 5000,
            window_ms: 6000,
        };
        assert!(!e.is_rejection());
        assert_eq!(e.public_message(), "internal error");
        assert!(e.to_string().contains("6000ms"));
    }
}
