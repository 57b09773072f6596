//! Latchkey Crypto - the macaroon primitive.
//!
//! This crate provides:
//! - Root keys with secure memory handling
//! - Macaroons sealed by the standard chained HMAC, backed by the
//!   `macaroon` crate
//! - The V2 binary wire format with a hex text form
//!
//! # Example
//!
//! ```
//! use latchkey_crypto::{Macaroon, RootKey};
//!
//! let root = RootKey::generate();
//! let mut macaroon = Macaroon::new(&root, 7u32.to_be_bytes().to_vec(), "latchkey").unwrap();
//! macaroon.add_first_party_caveat("user 7").unwrap();
//!
//! let wire = macaroon.to_hex().unwrap();
//! let decoded = Macaroon::from_hex(&wire).unwrap();
//! assert!(decoded.verify(&root).is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod codec;
mod error;
mod key;
mod token;

pub use codec::MAX_ENCODED_LEN;
pub use error::{CryptoError, CryptoResult};
pub use key::{MAX_ROOT_KEY_LEN, MIN_ROOT_KEY_LEN, RootKey};
pub use token::{
    Caveat, MAX_CAVEAT_LEN, MAX_CAVEATS, MAX_ID_LEN, MAX_LOCATION_LEN, Macaroon, SIGNATURE_LEN,
};
