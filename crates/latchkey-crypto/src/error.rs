//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key length.
    #[error("invalid key length: expected {min}..={max} bytes, got {actual}")]
    InvalidKeyLength {
        /// Minimum accepted length in bytes.
        min: usize,
        /// Maximum accepted length in bytes.
        max: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// A macaroon field or the whole encoding exceeds its size limit.
    #[error("{what} exceeds limit: {actual} > {limit}")]
    LimitExceeded {
        /// Which field overflowed.
        what: &'static str,
        /// Configured limit.
        limit: usize,
        /// Observed size.
        actual: usize,
    },

    /// Binary encoding is truncated, has trailing data or an unknown version.
    #[error("malformed macaroon encoding: {0}")]
    Malformed(String),

    /// The macaroon backend could not initialize its crypto library.
    #[error("macaroon backend initialization failed")]
    BackendUnavailable,

    /// Signature verification failed.
    #[error("signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid hex encoding.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// I/O error (e.g. reading/writing key files).
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
