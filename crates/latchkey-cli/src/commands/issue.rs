//! Issue command - mint a token for a subject.

use std::sync::Arc;

use latchkey_auth::SubjectId;
use latchkey_config::Config;
use latchkey_storage::MemoryStore;

use crate::config_bridge;

/// Print a token for `subject` with `disable` on its deny-list.
pub(crate) fn run_issue(config: &Config, subject: u32, disable: &[String]) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new(config.nonce_retention()));
    let auth = config_bridge::build_authenticator(config, store)?;

    let disabled: Vec<&str> = disable.iter().map(String::as_str).collect();
    let ops = (!disabled.is_empty()).then_some(disabled.as_slice());
    let token = auth.issue(SubjectId(subject), ops)?;

    println!("{token}");
    Ok(())
}
