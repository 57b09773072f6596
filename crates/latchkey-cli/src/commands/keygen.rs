//! Keygen command - create a root key.

use std::path::Path;

use latchkey_crypto::RootKey;

use crate::theme::Theme;

/// Print a new root key, or write it to `output`.
pub(crate) fn run_keygen(output: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = output else {
        let key = RootKey::generate();
        println!("{}", key.to_hex().as_str());
        return Ok(());
    };

    if path.exists() {
        anyhow::bail!(
            "{} already exists; remove it first to replace the key",
            path.display()
        );
    }
    let key = RootKey::load_or_generate(path)?;

    println!("{}", Theme::success("New root key generated."));
    println!("  Fingerprint: {}", key.fingerprint());
    println!("  Key file:    {}", path.display());
    println!(
        "{}",
        Theme::info("Set auth.root_key_file to this path to use it.")
    );
    Ok(())
}
