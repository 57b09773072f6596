//! Environment variable overrides.
//!
//! Environment variables have the highest precedence: they replace whatever
//! the embedded defaults or config files set.

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

/// Prefix of every recognised variable.
pub const ENV_PREFIX: &str = "LATCHKEY_";

/// Environment variable to dotted config path, and whether it is an integer.
const OVERRIDES: &[(&str, &str, bool)] = &[
    ("LATCHKEY_ROOT_KEY", "auth.root_key", false),
    ("LATCHKEY_ROOT_KEY_FILE", "auth.root_key_file", false),
    ("LATCHKEY_LOCATION", "auth.location", false),
    ("LATCHKEY_LIFETIME_MS", "auth.lifetime_ms", true),
    ("LATCHKEY_LOG_LEVEL", "logging.level", false),
];

/// Snapshot the `LATCHKEY_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .collect()
}

/// Write recognised variables into the merged TOML tree.
///
/// Returns the number of fields overridden.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if an integer variable does not
/// parse.
pub fn apply_env_overrides(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut count = 0usize;
    for (var, path, integer) in OVERRIDES {
        let Some(raw) = env_vars.get(*var) else {
            continue;
        };
        let value = if *integer {
            let n: i64 = raw.trim().parse().map_err(|_| ConfigError::ValidationError {
                field: (*var).to_owned(),
                message: format!("expected a non-negative integer, got '{raw}'"),
            })?;
            toml::Value::Integer(n)
        } else {
            toml::Value::String(raw.clone())
        };
        set_path(merged, path, value);
        count = count.saturating_add(1);
    }
    Ok(count)
}

fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let toml::Value::Table(table) = current else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}
