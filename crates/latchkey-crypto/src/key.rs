//! Root secret with secure memory handling.
//!
//! The root key is the single symmetric secret used both to mint macaroons
//! and to verify them. It never leaves the issuer.

use std::io::Write;
use std::path::Path;

use macaroon::MacaroonKey;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};

/// Minimum root key length in bytes.
pub const MIN_ROOT_KEY_LEN: usize = 32;

/// Maximum root key length in bytes.
pub const MAX_ROOT_KEY_LEN: usize = 64;

/// A root secret, zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct RootKey {
    bytes: Vec<u8>,
}

impl RootKey {
    /// Generate a new random 32-byte root key from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_ROOT_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create from raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the slice is shorter than
    /// 32 or longer than 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if !(MIN_ROOT_KEY_LEN..=MAX_ROOT_KEY_LEN).contains(&bytes.len()) {
            return Err(CryptoError::InvalidKeyLength {
                min: MIN_ROOT_KEY_LEN,
                max: MAX_ROOT_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Decode from a hex string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidHexEncoding`] for bad hex, or
    /// [`CryptoError::InvalidKeyLength`] for a wrong length.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes =
            Zeroizing::new(hex::decode(s.trim()).map_err(|_| CryptoError::InvalidHexEncoding)?);
        Self::from_bytes(&bytes)
    }

    /// Encode as hex (careful - sensitive!).
    #[must_use]
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.bytes))
    }

    /// Length of the secret in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; construction rejects short keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short, non-reversible fingerprint for logs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.bytes);
        hex::encode(&hash.as_bytes()[..4])
    }

    /// Derive the key that seeds the macaroon signature chain.
    ///
    /// Uses the standard `macaroons-key-generator` HMAC derivation, so a
    /// root key shared with another macaroon implementation yields the same
    /// signatures.
    pub(crate) fn macaroon_key(&self) -> MacaroonKey {
        MacaroonKey::generate(&self.bytes)
    }

    /// Load an existing key from a file, or generate and save a new one.
    ///
    /// The file holds the raw secret bytes. New files are created atomically
    /// with mode 0o600 on Unix. Symlinks are refused.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IoError`] on I/O failures or symlink detection,
    /// or [`CryptoError::InvalidKeyLength`] if the file has a wrong length.
    pub fn load_or_generate(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CryptoError::IoError(e.to_string()))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o600)
                .open(path)
            {
                Ok(mut file) => {
                    let key = Self::generate();
                    file.write_all(&key.bytes)
                        .map_err(|e| CryptoError::IoError(e.to_string()))?;
                    return Ok(key);
                },
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {},
                Err(e) => return Err(CryptoError::IoError(e.to_string())),
            }
        }

        #[cfg(not(unix))]
        if !path.exists() {
            let key = Self::generate();
            let mut file =
                std::fs::File::create(path).map_err(|e| CryptoError::IoError(e.to_string()))?;
            file.write_all(&key.bytes)
                .map_err(|e| CryptoError::IoError(e.to_string()))?;
            return Ok(key);
        }

        let meta =
            std::fs::symlink_metadata(path).map_err(|e| CryptoError::IoError(e.to_string()))?;
        if meta.file_type().is_symlink() {
            return Err(CryptoError::IoError(
                "refusing to read key file: path is a symlink".into(),
            ));
        }

        let bytes =
            Zeroizing::new(std::fs::read(path).map_err(|e| CryptoError::IoError(e.to_string()))?);
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootKey")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}
