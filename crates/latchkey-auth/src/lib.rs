//! Latchkey Auth - macaroon tokens with replay protection.
//!
//! This crate provides:
//! - A write-once caveat dictionary over `key value` caveats
//! - The freshness protocol: client nonce and timestamp caveats, checked
//!   against a lifetime and a [`NonceStore`](latchkey_storage::NonceStore)
//! - An operation deny-list carried in the token
//! - [`Authenticator`], which issues tokens and verifies prepared requests
//! - Client helpers for preparing requests
//!
//! # Security Model
//!
//! An issued token is a bearer credential and is never sent as is. For each
//! request the client adds a fresh nonce and the current time, which extends
//! the signature chain. The verifier rejects anything that is older than the
//! freshness lifetime or whose nonce it has already seen, so an intercepted
//! request cannot be replayed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use latchkey_auth::{AuthSettings, Authenticator, SubjectId, client};
//! use latchkey_crypto::RootKey;
//! use latchkey_storage::MemoryStore;
//!
//! let nonces = Arc::new(MemoryStore::new(Duration::from_secs(6)));
//! let auth = Authenticator::new(AuthSettings::default(), RootKey::generate(), nonces).unwrap();
//!
//! let token = auth.issue(SubjectId(100), Some(&["delete"][..])).unwrap();
//! let request = client::prepare_request(&token, 1).unwrap();
//!
//! let verified = auth.verify(&request).unwrap();
//! assert_eq!(verified.subject_id(), SubjectId(100));
//! assert!(verified.is_authorized("read").is_ok());
//! assert!(verified.is_authorized("delete").is_err());
//!
//! // The same request is refused the second time.
//! assert!(auth.verify(&request).is_err());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod client;
pub mod prelude;

mod authenticator;
mod dictionary;
mod error;
mod freshness;
mod operations;
mod subject;
mod token;

pub use authenticator::{AuthSettings, Authenticator, DEFAULT_LOCATION};
pub use dictionary::{CaveatDictionary, Field, Fields};
pub use error::{AuthError, AuthResult, PUBLIC_INVALID_TOKEN};
pub use freshness::{
    DEFAULT_CLOCK_SKEW, DEFAULT_LIFETIME, FreshnessPolicy, add_current_time, add_nonce, add_time,
    check_freshness, check_freshness_at, issued_at,
};
pub use operations::{disable_operations, disabled_operations, is_operation_allowed};
pub use subject::SubjectId;
pub use token::Token;
