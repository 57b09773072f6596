//! Verify command - the server step for every request.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use latchkey_auth::client::parse_authorization_header;
use latchkey_auth::{AuthResult, Authenticator, Token};
use latchkey_config::Config;
use latchkey_storage::MemoryStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config_bridge;
use crate::theme::Theme;

/// Verify one token, or with `-` every line of stdin against one nonce store.
pub(crate) async fn run_verify(
    config: &Config,
    token: &str,
    operation: Option<&str>,
) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new(config.nonce_retention()));
    let auth = config_bridge::build_authenticator(config, Arc::clone(&store))?;

    if token != "-" {
        let verified = check(&auth, token, operation).context("token rejected")?;
        println!(
            "{}",
            Theme::success(&format!("valid token for subject {}", verified.subject_id()))
        );
        if let Some(at) = verified.issued_at() {
            println!("  {} {}", Theme::dimmed("prepared at"), at.to_rfc3339());
        }
        return Ok(());
    }

    let tally = verify_stream(
        &auth,
        &store,
        BufReader::new(tokio::io::stdin()),
        operation,
        config.nonces.sweep_interval(),
    )
    .await?;
    if tally.rejected > 0 {
        let total = tally.accepted.saturating_add(tally.rejected);
        eprintln!(
            "{}",
            Theme::warning(&format!("{} of {total} tokens rejected", tally.rejected))
        );
    }
    Ok(())
}

/// Verify a stream of tokens while a sweeper evicts stale nonces from `store`.
///
/// The sweeper is stopped before returning, also when reading fails.
async fn verify_stream<R>(
    auth: &Authenticator,
    store: &Arc<MemoryStore>,
    reader: R,
    operation: Option<&str>,
    sweep_interval: Duration,
) -> anyhow::Result<Tally>
where
    R: AsyncBufRead + Unpin,
{
    let sweeper = store.spawn_sweeper(sweep_interval);
    let mut tally = Tally::default();
    let read = verify_lines(auth, reader, operation, &mut tally).await;
    sweeper.shutdown().await;

    tracing::info!(
        accepted = tally.accepted,
        rejected = tally.rejected,
        "verification finished"
    );
    read.context("failed to read tokens")?;
    Ok(tally)
}

/// Counts of verified and rejected lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    accepted: usize,
    rejected: usize,
}

/// Verify every non-empty line of `reader`, printing one verdict per line.
///
/// Stops at the first read error; `tally` keeps the lines handled so far.
async fn verify_lines<R>(
    auth: &Authenticator,
    reader: R,
    operation: Option<&str>,
    tally: &mut Tally,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match check(auth, line, operation) {
            Ok(verified) => {
                tally.accepted = tally.accepted.saturating_add(1);
                println!("ok {}", verified.subject_id());
            },
            Err(e) => {
                tally.rejected = tally.rejected.saturating_add(1);
                println!("rejected {}", e.public_message());
            },
        }
    }
    Ok(())
}

/// Accepts a bare token or an `Authorization` header value.
fn check(auth: &Authenticator, input: &str, operation: Option<&str>) -> AuthResult<Token> {
    let token = parse_authorization_header(input).unwrap_or(input);
    let verified = auth.verify(token)?;
    if let Some(op) = operation {
        verified.is_authorized(op)?;
    }
    Ok(verified)
}
