//! Any modification of a token's bytes must fail verification.

mod common;

use common::AuthHarness;
use latchkey_auth::{AuthError, PUBLIC_INVALID_TOKEN};
use latchkey_crypto::Macaroon;
use latchkey_storage::NonceStore;

fn flipped(bytes: &[u8], index: usize, mask: u8) -> String {
    let mut copy = bytes.to_vec();
    copy[index] ^= mask;
    hex::encode(copy)
}

#[test]
fn test_every_byte_flip_fails() {
    let h = AuthHarness::new();
    let request = h.prepare(&h.issue(100, &["disabled"]), 1);
    let bytes = Macaroon::from_hex(&request).unwrap().to_bytes().unwrap();

    for index in 0..bytes.len() {
        for mask in [0x01, 0x80] {
            let tampered = flipped(&bytes, index, mask);
            let Err(err) = h.auth.verify(&tampered) else {
                panic!("flip {mask:#04x} at byte {index} verified");
            };
            assert!(err.is_rejection());
            assert_eq!(err.public_message(), PUBLIC_INVALID_TOKEN);
        }
    }

    // Tampered requests never reach the nonce check.
    assert!(h.store.is_empty());
    assert!(h.auth.verify(&request).is_ok());
}

#[test]
fn test_truncation_fails() {
    let h = AuthHarness::new();
    let request = h.prepare(&h.issue(8, &[]), 1);
    let bytes = Macaroon::from_hex(&request).unwrap().to_bytes().unwrap();

    for len in 0..bytes.len() {
        assert!(
            h.auth.verify(&hex::encode(&bytes[..len])).is_err(),
            "truncation to {len} bytes verified"
        );
    }
}

#[test]
fn test_dropped_caveat_fails() {
    let h = AuthHarness::new();
    let token = h.issue(100, &["disabled"]);
    let issued = Macaroon::from_hex(&token).unwrap();

    // Rebuild the chain without the deny-list, reusing the final signature.
    let mut stripped = Macaroon::new(&h.key, issued.id().to_vec(), issued.location()).unwrap();
    for caveat in issued.caveats().iter().skip(1) {
        stripped
            .add_first_party_caveat(caveat.as_bytes().to_vec())
            .unwrap();
    }
    let mut bytes = stripped.to_bytes().unwrap();
    let signature = issued.signature();
    let sig_start = bytes.len().saturating_sub(signature.len());
    bytes[sig_start..].copy_from_slice(&signature);

    let request = h.prepare(&hex::encode(bytes), 1);
    assert!(matches!(
        h.auth.verify(&request),
        Err(AuthError::SignatureInvalid)
    ));
}

#[test]
fn test_relocated_token_rejected() {
    let h = AuthHarness::new();
    let request = Macaroon::from_hex(&h.prepare(&h.issue(3, &[]), 1)).unwrap();
    let mut bytes = request.to_bytes().unwrap();

    // The location sits right after the version, tag and length bytes.
    assert_eq!(&bytes[3..11], b"latchkey");
    bytes[3..11].copy_from_slice(b"intruder");
    let relocated = Macaroon::from_bytes(&bytes).unwrap();
    assert!(relocated.verify(&h.key).is_ok());

    assert!(matches!(
        h.auth.verify(&hex::encode(bytes)),
        Err(AuthError::LocationMismatch)
    ));
    assert!(h.store.is_empty());
}

#[test]
fn test_garbage_input_rejected() {
    let h = AuthHarness::new();
    for input in ["", "   ", "zz", "abc", "00", "ffffffffffffffff"] {
        let err = h.auth.verify(input).unwrap_err();
        assert_eq!(err.public_message(), PUBLIC_INVALID_TOKEN, "input {input:?}");
    }
}
