//! Root key store interface.

use latchkey_crypto::RootKey;

use crate::error::StorageResult;

/// Holds the issuer's root secret.
///
/// Used for bootstrapping an authenticator from storage. Rotation is not
/// supported; `put_root_key` simply replaces the stored key.
pub trait RootKeyStore: Send + Sync {
    /// Return the stored root key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound) if
    /// no key has been stored.
    fn get_root_key(&self) -> StorageResult<RootKey>;

    /// Store a root key, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn put_root_key(&self, key: RootKey) -> StorageResult<()>;
}
