//! Macaroons: bearer tokens sealed by a chained HMAC.
//!
//! The chain itself comes from the `macaroon` crate: the signature starts as
//! an HMAC of the id under a key derived from the root secret, and every
//! caveat re-keys it (`sig' = hmac(sig, caveat)`). Anyone holding a macaroon
//! can append caveats without the root key, but nobody can remove or alter
//! one without invalidating the signature.
//!
//! The location is a hint and is not covered by the signature. Verifiers
//! that care about it must compare it themselves.
//!
//! This wrapper only admits first-party caveats and enforces size limits on
//! every field.

use std::fmt;
use std::sync::OnceLock;

use macaroon::{ByteString, Caveat as RawCaveat, Macaroon as RawMacaroon, Verifier};

use crate::error::{CryptoError, CryptoResult};
use crate::key::RootKey;

/// Maximum location length in bytes.
pub const MAX_LOCATION_LEN: usize = 256;

/// Maximum id length in bytes.
pub const MAX_ID_LEN: usize = 256;

/// Maximum length of a single caveat in bytes.
pub const MAX_CAVEAT_LEN: usize = 4096;

/// Maximum number of caveats on one macaroon.
pub const MAX_CAVEATS: usize = 64;

/// Length of a macaroon signature in bytes.
pub const SIGNATURE_LEN: usize = 32;

/// A first-party caveat: an opaque byte string bound into the signature chain.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Caveat(pub(crate) Vec<u8>);

impl Caveat {
    /// Get the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the caveat as UTF-8, if it is.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Debug for Caveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "Caveat({s:?})"),
            None => write!(f, "Caveat(0x{})", hex::encode(&self.0)),
        }
    }
}

impl AsRef<[u8]> for Caveat {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A macaroon: location, id, ordered first-party caveats and a chained
/// signature.
///
/// Cloning produces an independent copy; adding a caveat to the clone never
/// affects the original.
#[derive(Clone, PartialEq, Eq)]
pub struct Macaroon {
    pub(crate) inner: RawMacaroon,
    location: String,
    id: Vec<u8>,
    caveats: Vec<Caveat>,
}

impl Macaroon {
    /// Mint a new macaroon bound to `root_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::LimitExceeded`] if the id or location is too
    /// long, and [`CryptoError::Malformed`] for an empty id.
    pub fn new(
        root_key: &RootKey,
        id: impl Into<Vec<u8>>,
        location: impl Into<String>,
    ) -> CryptoResult<Self> {
        let id = id.into();
        let location = location.into();
        check_limit("location", location.len(), MAX_LOCATION_LEN)?;
        check_limit("id", id.len(), MAX_ID_LEN)?;
        ensure_backend()?;

        let inner = RawMacaroon::create(
            Some(location.clone()),
            &root_key.macaroon_key(),
            ByteString(id.clone()),
        )
        .map_err(malformed)?;

        Ok(Self {
            inner,
            location,
            id,
            caveats: Vec::new(),
        })
    }

    /// Wrap a macaroon produced by the backend, applying this crate's limits.
    pub(crate) fn from_raw(inner: RawMacaroon) -> CryptoResult<Self> {
        let location = inner.location().unwrap_or_default();
        check_limit("location", location.len(), MAX_LOCATION_LEN)?;
        let id = inner.identifier().0;
        check_limit("id", id.len(), MAX_ID_LEN)?;

        let raw_caveats = inner.caveats();
        check_limit("caveat count", raw_caveats.len(), MAX_CAVEATS)?;
        let caveats = raw_caveats
            .into_iter()
            .map(|caveat| match caveat {
                RawCaveat::FirstParty(fp) => {
                    let bytes = fp.predicate().0;
                    check_limit("caveat", bytes.len(), MAX_CAVEAT_LEN)?;
                    Ok(Caveat(bytes))
                },
                RawCaveat::ThirdParty(_) => Err(CryptoError::Malformed(
                    "third-party caveats are not supported".into(),
                )),
            })
            .collect::<CryptoResult<Vec<_>>>()?;

        Ok(Self {
            inner,
            location,
            id,
            caveats,
        })
    }

    /// The location hint.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The opaque id.
    #[must_use]
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Caveats in the order they were added.
    #[must_use]
    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// The current chain signature.
    #[must_use]
    pub fn signature(&self) -> [u8; SIGNATURE_LEN] {
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&self.inner.signature());
        signature
    }

    /// Append a first-party caveat and advance the signature chain.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::LimitExceeded`] if the caveat is too long or
    /// the macaroon already carries the maximum number of caveats.
    pub fn add_first_party_caveat(&mut self, caveat: impl Into<Vec<u8>>) -> CryptoResult<()> {
        let caveat = caveat.into();
        check_limit("caveat", caveat.len(), MAX_CAVEAT_LEN)?;
        check_limit(
            "caveat count",
            self.caveats.len().saturating_add(1),
            MAX_CAVEATS,
        )?;

        self.inner.add_first_party_caveat(ByteString(caveat.clone()));
        self.caveats.push(Caveat(caveat));
        Ok(())
    }

    /// Verify the signature chain against `root_key`.
    ///
    /// Caveat contents are not interpreted here; callers check them after
    /// the chain is known to be intact.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] if the id or any
    /// caveat was altered, or the macaroon was minted under a different key.
    pub fn verify(&self, root_key: &RootKey) -> CryptoResult<()> {
        let mut verifier = Verifier::default();
        verifier.satisfy_general(any_caveat);
        verifier
            .verify(&self.inner, &root_key.macaroon_key(), Vec::new())
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl fmt::Debug for Macaroon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = hex::encode(self.signature());
        f.debug_struct("Macaroon")
            .field("location", &self.location)
            .field("id", &hex::encode(&self.id))
            .field("caveats", &self.caveats)
            .field("signature", &&signature[..16])
            .finish()
    }
}

fn any_caveat(_: &ByteString) -> bool {
    true
}

/// Initialize the backend's crypto library once per process.
pub(crate) fn ensure_backend() -> CryptoResult<()> {
    static READY: OnceLock<bool> = OnceLock::new();
    if *READY.get_or_init(|| macaroon::initialize().is_ok()) {
        Ok(())
    } else {
        Err(CryptoError::BackendUnavailable)
    }
}

pub(crate) fn malformed(e: macaroon::MacaroonError) -> CryptoError {
    CryptoError::Malformed(e.to_string())
}

pub(crate) fn check_limit(what: &'static str, actual: usize, limit: usize) -> CryptoResult<()> {
    if actual > limit {
        return Err(CryptoError::LimitExceeded {
            what,
            limit,
            actual,
        });
    }
    Ok(())
}
