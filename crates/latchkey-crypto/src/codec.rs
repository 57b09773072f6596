//! Binary and hex wire format for macaroons.
//!
//! The binary form is the standard macaroon V2 encoding, so tokens are
//! readable by any other V2 implementation. The text form is lowercase hex
//! of those bytes.
//!
//! Decoding only accepts V2 input in its canonical encoding; trailing bytes
//! and alternative encodings of the same fields are rejected.

use base64::Engine;
use macaroon::{Format, Macaroon as RawMacaroon};

use crate::error::{CryptoError, CryptoResult};
use crate::token::{Macaroon, check_limit, ensure_backend, malformed};

/// First byte of every V2 encoded macaroon.
const FORMAT_V2: u8 = 0x02;

/// Maximum accepted size of an encoded macaroon in bytes.
pub const MAX_ENCODED_LEN: usize = 64 * 1024;

impl Macaroon {
    /// Serialize to the V2 binary format.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Malformed`] if the backend fails to encode.
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        let encoded = self.inner.serialize(Format::V2).map_err(malformed)?;
        base64::engine::general_purpose::URL_SAFE
            .decode(encoded)
            .map_err(|e| CryptoError::Malformed(e.to_string()))
    }

    /// Deserialize from the V2 binary format.
    ///
    /// Only the structure is checked here; call [`Macaroon::verify`] to
    /// check the signature.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Malformed`] for truncated input, trailing
    /// bytes, an unknown version or third-party caveats, and
    /// [`CryptoError::LimitExceeded`] when a field is oversized.
    pub fn from_bytes(data: &[u8]) -> CryptoResult<Self> {
        check_limit("encoded macaroon", data.len(), MAX_ENCODED_LEN)?;
        match data.first() {
            Some(&FORMAT_V2) => {},
            Some(version) => {
                return Err(CryptoError::Malformed(format!(
                    "unsupported version 0x{version:02x}"
                )));
            },
            None => return Err(CryptoError::Malformed("empty macaroon".into())),
        }

        ensure_backend()?;
        let macaroon = Self::from_raw(RawMacaroon::deserialize_binary(data).map_err(malformed)?)?;

        if macaroon.to_bytes()? != data {
            return Err(CryptoError::Malformed(
                "trailing or non-canonical bytes".into(),
            ));
        }
        Ok(macaroon)
    }

    /// Serialize to lowercase hex of the binary format.
    ///
    /// # Errors
    ///
    /// Same as [`Macaroon::to_bytes`].
    pub fn to_hex(&self) -> CryptoResult<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Deserialize from hex of the binary format.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidHexEncoding`] for bad hex, otherwise the
    /// same errors as [`Macaroon::from_bytes`].
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| CryptoError::InvalidHexEncoding)?;
        Self::from_bytes(&bytes)
    }
}
