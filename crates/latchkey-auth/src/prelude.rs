//! Prelude module - commonly used types for convenient import.
//!
//! Use `use latchkey_auth::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuthError, AuthResult};

// Issuing and verifying
pub use crate::{AuthSettings, Authenticator, FreshnessPolicy, SubjectId, Token};

// Caveats
pub use crate::{CaveatDictionary, Field, Fields};

// Client side
pub use crate::client::{NonceSequence, prepare_request};
