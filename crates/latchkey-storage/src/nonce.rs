//! Nonce store interface.

use std::time::Duration;

use crate::error::StorageResult;

/// Remembers which `(subject, nonce)` pairs have been presented.
///
/// Implementations must make [`use_nonce`](NonceStore::use_nonce) a single
/// atomic check-and-record step: two concurrent callers presenting the same
/// pair must never both observe "not used".
pub trait NonceStore: Send + Sync {
    /// Check and record a nonce for a subject.
    ///
    /// Returns `Ok(true)` if the pair was already present (its last-seen
    /// time is refreshed), or `Ok(false)` if it was not, in which case it
    /// is now recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn use_nonce(&self, subject: u32, nonce: i64) -> StorageResult<bool>;

    /// Drop every entry whose last use is older than the retention period.
    ///
    /// Returns the number of evicted entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn sweep_expired(&self) -> StorageResult<usize>;

    /// How long an unused entry is remembered.
    fn retention(&self) -> Duration;

    /// Number of remembered pairs.
    fn len(&self) -> usize;

    /// Whether no pairs are remembered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
