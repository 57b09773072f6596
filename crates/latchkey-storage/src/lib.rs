//! Latchkey Storage - nonce and root key stores.
//!
//! Provides the two storage seams of the authenticator:
//!
//! - [`NonceStore`]: remembers presented `(subject, nonce)` pairs so a
//!   macaroon cannot be replayed within its freshness window.
//! - [`RootKeyStore`]: holds the issuer's root secret.
//!
//! [`MemoryStore`] implements both in process memory, and
//! [`NonceSweeper`] evicts stale nonces in the background.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use latchkey_storage::{MemoryStore, NonceStore};
//!
//! let store = MemoryStore::new(Duration::from_secs(6));
//! assert!(!store.use_nonce(100, 1).unwrap()); // first use
//! assert!(store.use_nonce(100, 1).unwrap()); // replay
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;

mod memory;
mod nonce;
mod root_key;
mod sweeper;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use nonce::NonceStore;
pub use root_key::RootKeyStore;
pub use sweeper::NonceSweeper;
