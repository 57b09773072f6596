//! Freshness protocol: client nonce and timestamp caveats.
//!
//! Before every request the client adds a `nonce` and a `time` caveat to a
//! copy of its token. The verifier accepts the macaroon only if the time is
//! within the freshness lifetime and the `(subject, nonce)` pair has not
//! been seen. A captured request therefore replays for at most the lifetime
//! and only if the nonce store has forgotten it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use latchkey_crypto::Macaroon;
use latchkey_storage::NonceStore;

use crate::dictionary::{CaveatDictionary, Field, Fields};
use crate::error::{AuthError, AuthResult};
use crate::subject::SubjectId;

/// Default freshness lifetime of a prepared macaroon.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(5);

/// Default tolerance for client clocks running ahead of the verifier.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(1);

/// How old, or how far ahead, a client timestamp may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// Maximum age of the `time` caveat.
    pub lifetime: Duration,
    /// Maximum distance of the `time` caveat into the future.
    pub clock_skew: Duration,
}

impl FreshnessPolicy {
    /// How long a nonce store must remember a pair to cover this policy.
    #[must_use]
    pub fn replay_window(&self) -> Duration {
        self.lifetime.saturating_add(self.clock_skew)
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            lifetime: DEFAULT_LIFETIME,
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }
}

/// Return a copy of `macaroon` carrying `nonce <nonce>`.
///
/// # Errors
///
/// Returns [`AuthError::FieldExists`] if a nonce is already present.
pub fn add_nonce(macaroon: &Macaroon, nonce: i64) -> AuthResult<Macaroon> {
    let mut fresh = macaroon.clone();
    CaveatDictionary::open(&mut fresh)?.put(Field::Nonce, &nonce.to_string())?;
    Ok(fresh)
}

/// Return a copy of `macaroon` stamped with the current time.
///
/// # Errors
///
/// Returns [`AuthError::FieldExists`] if a time is already present.
pub fn add_current_time(macaroon: &Macaroon) -> AuthResult<Macaroon> {
    add_time(macaroon, Utc::now())
}

/// Return a copy of `macaroon` carrying `time <unix nanoseconds of at>`.
///
/// # Errors
///
/// Returns [`AuthError::FieldExists`] if a time is already present, or
/// [`AuthError::MalformedCaveat`] if `at` is outside the nanosecond range.
pub fn add_time(macaroon: &Macaroon, at: DateTime<Utc>) -> AuthResult<Macaroon> {
    let nanos = unix_nanos(at)?;
    let mut fresh = macaroon.clone();
    CaveatDictionary::open(&mut fresh)?.put(Field::Time, &nanos.to_string())?;
    Ok(fresh)
}

/// Check the `time` and `nonce` caveats and record the nonce as used.
///
/// The nonce is recorded only once the timestamp has been accepted.
///
/// # Errors
///
/// In order: [`AuthError::FieldNotFound`] or [`AuthError::MalformedCaveat`]
/// for the time, [`AuthError::MacaroonExpired`],
/// [`AuthError::TimestampInFuture`], [`AuthError::FieldNotFound`] or
/// [`AuthError::MalformedCaveat`] for the nonce, [`AuthError::NonceRepeated`].
pub fn check_freshness(
    macaroon: &Macaroon,
    subject: SubjectId,
    nonces: &dyn NonceStore,
    policy: &FreshnessPolicy,
) -> AuthResult<()> {
    check_freshness_at(macaroon, subject, nonces, policy, Utc::now())
}

/// [`check_freshness`] against an explicit verifier clock.
///
/// # Errors
///
/// Same as [`check_freshness`].
pub fn check_freshness_at(
    macaroon: &Macaroon,
    subject: SubjectId,
    nonces: &dyn NonceStore,
    policy: &FreshnessPolicy,
    now: DateTime<Utc>,
) -> AuthResult<()> {
    let fields = Fields::parse(macaroon)?;

    let created = parse_i64(&fields, Field::Time)?;
    let now = unix_nanos(now)?;
    let age = i128::from(now).saturating_sub(i128::from(created));
    if age > nanos_of(policy.lifetime) {
        return Err(AuthError::MacaroonExpired);
    }
    if age.saturating_neg() > nanos_of(policy.clock_skew) {
        return Err(AuthError::TimestampInFuture);
    }

    let nonce = parse_i64(&fields, Field::Nonce)?;
    if nonces.use_nonce(subject.0, nonce)? {
        return Err(AuthError::NonceRepeated);
    }
    Ok(())
}

/// Timestamp of the `time` caveat, if present and well formed.
#[must_use]
pub fn issued_at(fields: &Fields) -> Option<DateTime<Utc>> {
    parse_i64(fields, Field::Time)
        .ok()
        .map(DateTime::from_timestamp_nanos)
}

fn parse_i64(fields: &Fields, field: Field) -> AuthResult<i64> {
    let raw = fields.get(field)?;
    raw.parse()
        .map_err(|_| AuthError::MalformedCaveat(format!("{field} value {raw:?} is not an integer")))
}

fn unix_nanos(at: DateTime<Utc>) -> AuthResult<i64> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| AuthError::MalformedCaveat(format!("timestamp {at} out of range")))
}

fn nanos_of(d: Duration) -> i128 {
    i128::try_from(d.as_nanos()).unwrap_or(i128::MAX)
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use latchkey_crypto::RootKey;
    use latchkey_storage::MemoryStore;

    const SUBJECT: SubjectId = SubjectId(100);

    fn base() -> Macaroon {
        Macaroon::new(&RootKey::generate(), SUBJECT.to_macaroon_id(), "test").unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new(Duration::from_secs(6))
    }

    fn prepared(nonce: i64, at: DateTime<Utc>) -> Macaroon {
        add_time(&add_nonce(&base(), nonce).unwrap(), at).unwrap()
    }

    #[test]
    fn test_add_nonce_leaves_original() {
        let original = base();
        let fresh = add_nonce(&original, 5).unwrap();
        assert!(original.caveats().is_empty());
        assert_eq!(fresh.caveats()[0].as_str(), Some("nonce 5"));
    }

    #[test]
    fn test_add_nonce_twice_fails() {
        let once = add_nonce(&base(), 1).unwrap();
        assert!(matches!(
            add_nonce(&once, 2),
            Err(AuthError::FieldExists(Field::Nonce))
        ));
    }

    #[test]
    fn test_add_time_encodes_nanos() {
        let at = DateTime::from_timestamp_nanos(1_700_000_000_123_456_789);
        let m = add_time(&base(), at).unwrap();
        assert_eq!(m.caveats()[0].as_str(), Some("time 1700000000123456789"));
        assert_eq!(issued_at(&Fields::parse(&m).unwrap()), Some(at));
    }

    #[test]
    fn test_fresh_macaroon_accepted_once() {
        let nonces = store();
        let policy = FreshnessPolicy::default();
        let m = prepared(1, Utc::now());

        check_freshness(&m, SUBJECT, &nonces, &policy).unwrap();
        assert!(matches!(
            check_freshness(&m, SUBJECT, &nonces, &policy),
            Err(AuthError::NonceRepeated)
        ));
    }

    #[test]
    fn test_same_nonce_other_subject_accepted() {
        let nonces = store();
        let policy = FreshnessPolicy::default();
        let m = prepared(1, Utc::now());

        check_freshness(&m, SUBJECT, &nonces, &policy).unwrap();
        check_freshness(&m, SubjectId(101), &nonces, &policy).unwrap();
    }

    #[test]
    fn test_expired_rejected_before_nonce_recorded() {
        let nonces = store();
        let policy = FreshnessPolicy::default();
        let now = Utc::now();
        let m = prepared(1, now - TimeDelta::seconds(6));

        assert!(matches!(
            check_freshness_at(&m, SUBJECT, &nonces, &policy, now),
            Err(AuthError::MacaroonExpired)
        ));
        assert!(nonces.is_empty());
    }

    #[test]
    fn test_lifetime_boundary_inclusive() {
        let nonces = store();
        let policy = FreshnessPolicy::default();
        let now = Utc::now();
        let m = prepared(1, now - TimeDelta::seconds(5));
        check_freshness_at(&m, SUBJECT, &nonces, &policy, now).unwrap();
    }

    #[test]
    fn test_future_timestamp_within_skew_accepted() {
        let nonces = store();
        let policy = FreshnessPolicy::default();
        let now = Utc::now();
        let m = prepared(1, now + TimeDelta::milliseconds(500));
        check_freshness_at(&m, SUBJECT, &nonces, &policy, now).unwrap();
    }

    #[test]
    fn test_future_timestamp_beyond_skew_rejected() {
        let nonces = store();
        let policy = FreshnessPolicy::default();
        let now = Utc::now();
        let m = prepared(1, now + TimeDelta::hours(1));
        assert!(matches!(
            check_freshness_at(&m, SUBJECT, &nonces, &policy, now),
            Err(AuthError::TimestampInFuture)
        ));
    }

    #[test]
    fn test_missing_caveats() {
        let nonces = store();
        let policy = FreshnessPolicy::default();

        let no_time = add_nonce(&base(), 1).unwrap();
        assert!(matches!(
            check_freshness(&no_time, SUBJECT, &nonces, &policy),
            Err(AuthError::FieldNotFound(Field::Time))
        ));

        let no_nonce = add_current_time(&base()).unwrap();
        assert!(matches!(
            check_freshness(&no_nonce, SUBJECT, &nonces, &policy),
            Err(AuthError::FieldNotFound(Field::Nonce))
        ));
    }

    #[test]
    fn test_non_integer_values_rejected() {
        let nonces = store();
        let policy = FreshnessPolicy::default();

        let mut m = base();
        m.add_first_party_caveat("time soon").unwrap();
        assert!(matches!(
            check_freshness(&m, SUBJECT, &nonces, &policy),
            Err(AuthError::MalformedCaveat(_))
        ));

        let mut m = add_current_time(&base()).unwrap();
        m.add_first_party_caveat("nonce 0x10").unwrap();
        assert!(matches!(
            check_freshness(&m, SUBJECT, &nonces, &policy),
            Err(AuthError::MalformedCaveat(_))
        ));
    }

    #[test]
    fn test_replay_window() {
        assert_eq!(
            FreshnessPolicy::default().replay_window(),
            Duration::from_secs(6)
        );
    }
}
