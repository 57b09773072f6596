//! Client side helpers.
//!
//! A client holds the token it was issued and, for every request, derives a
//! single-use copy with [`prepare_request`] and sends it in an
//! `Authorization: Macaroon <token>` header.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use latchkey_crypto::Macaroon;

use crate::error::{AuthError, AuthResult};
use crate::freshness::{add_current_time, add_nonce};

/// Authorization scheme name.
pub const AUTHORIZATION_SCHEME: &str = "Macaroon";

/// Add a nonce and the current time to an issued token.
///
/// # Errors
///
/// Returns [`AuthError::TokenEmpty`] or [`AuthError::Decode`] for an
/// unusable token, and [`AuthError::FieldExists`] if the token was already
/// prepared.
pub fn prepare_request(token: &str, nonce: i64) -> AuthResult<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::TokenEmpty);
    }
    let macaroon = Macaroon::from_hex(token).map_err(AuthError::Decode)?;
    let prepared = add_current_time(&add_nonce(&macaroon, nonce)?)?;
    Ok(prepared.to_hex()?)
}

/// Format an `Authorization` header value.
#[must_use]
pub fn authorization_header(token: &str) -> String {
    format!("{AUTHORIZATION_SCHEME} {token}")
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for another
/// scheme or an empty token.
#[must_use]
pub fn parse_authorization_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Source of distinct nonces for one client.
///
/// Seeded from the wall clock so that a restarted client does not reuse the
/// nonces of its previous run.
#[derive(Debug)]
pub struct NonceSequence {
    next: AtomicI64,
}

impl NonceSequence {
    /// Start at `first`.
    #[must_use]
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    /// Start at the current time in nanoseconds.
    #[must_use]
    pub fn from_clock() -> Self {
        Self::starting_at(Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    /// Take the next nonce.
    pub fn next_nonce(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for NonceSequence {
    fn default() -> Self {
        Self::from_clock()
    }
}
