//! Inspect command - decode a token without checking it.

use chrono::{DateTime, Utc};
use latchkey_auth::{Fields, SubjectId, disabled_operations, issued_at};
use latchkey_crypto::Macaroon;
use serde::Serialize;

use crate::theme::Theme;

/// Decoded view of a token.
#[derive(Debug, Serialize)]
struct Inspection {
    location: String,
    subject: Option<SubjectId>,
    caveats: Vec<String>,
    disabled_operations: Vec<String>,
    prepared_at: Option<DateTime<Utc>>,
    signature: String,
}

impl Inspection {
    fn of(macaroon: &Macaroon) -> Self {
        let fields = Fields::parse(macaroon).ok();
        Self {
            location: macaroon.location().to_owned(),
            subject: SubjectId::from_macaroon_id(macaroon.id()).ok(),
            caveats: macaroon
                .caveats()
                .iter()
                .map(|c| String::from_utf8_lossy(c.as_bytes()).into_owned())
                .collect(),
            disabled_operations: disabled_operations(macaroon).unwrap_or_default(),
            prepared_at: fields.as_ref().and_then(issued_at),
            signature: hex::encode(macaroon.signature()),
        }
    }
}

/// Print the location, subject and caveats of `token`.
pub(crate) fn run_inspect(token: &str, json: bool) -> anyhow::Result<()> {
    let macaroon = Macaroon::from_hex(token)?;
    let inspection = Inspection::of(&macaroon);

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    println!("{}", Theme::header("Token (unverified)"));
    println!("  {:<12} {}", Theme::dimmed("location"), inspection.location);
    match inspection.subject {
        Some(subject) => println!("  {:<12} {subject}", Theme::dimmed("subject")),
        None => println!("  {:<12} {}", Theme::dimmed("subject"), Theme::warning("invalid id")),
    }
    for caveat in &inspection.caveats {
        println!("  {:<12} {caveat}", Theme::dimmed("caveat"));
    }
    if let Some(at) = inspection.prepared_at {
        println!("  {:<12} {}", Theme::dimmed("prepared at"), at.to_rfc3339());
    }
    println!("  {:<12} {}", Theme::dimmed("signature"), inspection.signature);
    Ok(())
}
