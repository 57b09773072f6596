//! Prepare command - the client step before every request.

use latchkey_auth::client::{NonceSequence, authorization_header, prepare_request};

/// Print `token` with a nonce and the current time added.
pub(crate) fn run_prepare(token: &str, nonce: Option<i64>, header: bool) -> anyhow::Result<()> {
    let nonce = nonce.unwrap_or_else(|| NonceSequence::from_clock().next_nonce());
    let prepared = prepare_request(token, nonce)?;
    tracing::debug!(nonce, "prepared request");

    if header {
        println!("{}", authorization_header(&prepared));
    } else {
        println!("{prepared}");
    }
    Ok(())
}
