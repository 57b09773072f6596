//! Verified tokens.

use chrono::{DateTime, Utc};
use latchkey_crypto::Macaroon;

use crate::dictionary::Fields;
use crate::error::{AuthError, AuthResult};
use crate::freshness::issued_at;
use crate::operations::allowed_by;
use crate::subject::SubjectId;

/// A macaroon that passed signature, subject and freshness checks.
///
/// Only [`Authenticator::verify`](crate::Authenticator::verify) constructs
/// one, so holding a `Token` means the request was authenticated.
#[derive(Debug, Clone)]
pub struct Token {
    subject_id: SubjectId,
    fields: Fields,
    macaroon: Macaroon,
}

impl Token {
    pub(crate) fn new(subject_id: SubjectId, fields: Fields, macaroon: Macaroon) -> Self {
        Self {
            subject_id,
            fields,
            macaroon,
        }
    }

    /// Subject the token was issued to.
    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    /// The verified macaroon.
    #[must_use]
    pub fn macaroon(&self) -> &Macaroon {
        &self.macaroon
    }

    /// Parsed caveats of the verified macaroon.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Client timestamp carried by the request.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        issued_at(&self.fields)
    }

    /// Check that the token permits `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OperationNotAllowed`] if the operation is on the
    /// token's deny-list.
    pub fn is_authorized(&self, operation: &str) -> AuthResult<()> {
        if allowed_by(&self.fields, operation) {
            Ok(())
        } else {
            Err(AuthError::OperationNotAllowed(operation.to_owned()))
        }
    }
}
