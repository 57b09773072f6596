//! Prelude module - commonly used types for convenient import.
//!
//! Use `use latchkey_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Key material
pub use crate::RootKey;

// Macaroons
pub use crate::{Caveat, Macaroon};
