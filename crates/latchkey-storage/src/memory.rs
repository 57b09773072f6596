//! In-memory nonce and root key storage.
//!
//! Nothing here survives a restart. That is acceptable because verification
//! rejects any macaroon older than its freshness lifetime regardless of store
//! state: as long as retention covers the lifetime plus clock skew, a restart
//! cannot reopen a replay window longer than that.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use latchkey_crypto::RootKey;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::nonce::NonceStore;
use crate::root_key::RootKeyStore;
use crate::sweeper::NonceSweeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NonceKey {
    subject: u32,
    nonce: i64,
}

/// Nonce and root key store backed by process memory.
pub struct MemoryStore {
    /// Last-seen instant per `(subject, nonce)`; one lock for check-and-record.
    nonces: Mutex<HashMap<NonceKey, Instant>>,
    root_key: RwLock<Option<RootKey>>,
    retention: Duration,
}

impl MemoryStore {
    /// Create an empty store that remembers nonces for `retention`.
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            nonces: Mutex::new(HashMap::new()),
            root_key: RwLock::new(None),
            retention,
        }
    }

    /// Create a store pre-loaded with a root key.
    #[must_use]
    pub fn with_root_key(retention: Duration, key: RootKey) -> Self {
        Self {
            nonces: Mutex::new(HashMap::new()),
            root_key: RwLock::new(Some(key)),
            retention,
        }
    }

    /// Start the background sweeper for this store.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> NonceSweeper {
        let store: Arc<dyn NonceStore> = Arc::clone(self) as Arc<dyn NonceStore>;
        NonceSweeper::spawn(store, period)
    }

    fn sweep_at(&self, now: Instant) -> StorageResult<usize> {
        let mut nonces = self
            .nonces
            .lock()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let before = nonces.len();
        let retention = self.retention;
        nonces.retain(|_, last_seen| now.saturating_duration_since(*last_seen) <= retention);
        Ok(before.saturating_sub(nonces.len()))
    }
}

impl NonceStore for MemoryStore {
    fn use_nonce(&self, subject: u32, nonce: i64) -> StorageResult<bool> {
        let now = Instant::now();
        let mut nonces = self
            .nonces
            .lock()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        // insert returns the previous value: present means already used.
        let seen = nonces.insert(NonceKey { subject, nonce }, now).is_some();
        if seen {
            debug!(subject, nonce, "nonce already used");
        }
        Ok(seen)
    }

    fn sweep_expired(&self) -> StorageResult<usize> {
        self.sweep_at(Instant::now())
    }

    fn retention(&self) -> Duration {
        self.retention
    }

    fn len(&self) -> usize {
        // A panic while holding the lock leaves the map itself intact.
        self.nonces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RootKeyStore for MemoryStore {
    fn get_root_key(&self) -> StorageResult<RootKey> {
        let key = self
            .root_key
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        key.clone()
            .ok_or_else(|| StorageError::NotFound("root key".to_owned()))
    }

    fn put_root_key(&self, key: RootKey) -> StorageResult<()> {
        let mut slot = self
            .root_key
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        *slot = Some(key);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_root_key = self
            .root_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();

        f.debug_struct("MemoryStore")
            .field("nonces", &self.len())
            .field("retention", &self.retention)
            .field("has_root_key", &has_root_key)
            .finish()
    }
}
