//! Subject identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Numeric identifier of the principal a token was issued to.
///
/// Encoded as the macaroon id in 4 big-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub u32);

impl SubjectId {
    /// Length of the encoded id in bytes.
    pub const ENCODED_LEN: usize = 4;

    /// Encode as a macaroon id.
    #[must_use]
    pub fn to_macaroon_id(self) -> [u8; Self::ENCODED_LEN] {
        self.0.to_be_bytes()
    }

    /// Decode from a macaroon id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSubject`] unless `id` is exactly four bytes.
    pub fn from_macaroon_id(id: &[u8]) -> AuthResult<Self> {
        let bytes: [u8; Self::ENCODED_LEN] =
            id.try_into().map_err(|_| AuthError::InvalidSubject)?;
        Ok(Self(u32::from_be_bytes(bytes)))
    }
}

impl From<u32> for SubjectId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_encoding() {
        assert_eq!(SubjectId(100).to_macaroon_id(), [0, 0, 0, 100]);
        assert_eq!(SubjectId(0x0102_0304).to_macaroon_id(), [1, 2, 3, 4]);
        assert_eq!(
            SubjectId::from_macaroon_id(&[0, 0, 1, 0]).unwrap(),
            SubjectId(256)
        );
    }

    #[test]
    fn test_wrong_length_rejected() {
        for id in [&[][..], &[1, 2, 3][..], &[1, 2, 3, 4, 5][..]] {
            assert!(matches!(
                SubjectId::from_macaroon_id(id),
                Err(AuthError::InvalidSubject)
            ));
        }
    }
}
