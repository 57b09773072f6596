//! Configuration types.
//!
//! Every section implements [`Default`] with the production defaults, so a
//! bare `[section]` header in TOML produces a working configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Issuer identity, root secret and freshness rules.
    pub auth: AuthSection,
    /// Nonce retention and eviction.
    pub nonces: NoncesSection,
    /// Logging level, format and per-crate directives.
    pub logging: LoggingSection,
}

impl Config {
    /// How long used nonces must be remembered.
    ///
    /// An unset retention derives the replay window from the auth section.
    #[must_use]
    pub fn nonce_retention(&self) -> Duration {
        if self.nonces.retention_ms == 0 {
            self.auth.lifetime().saturating_add(self.auth.clock_skew())
        } else {
            Duration::from_millis(self.nonces.retention_ms)
        }
    }
}

/// Issuer settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Location hint written into issued macaroons.
    pub location: String,
    /// Root secret, hex encoded. Never serialized back out.
    #[serde(skip_serializing)]
    pub root_key: Option<String>,
    /// File holding the root secret; generated on first use.
    pub root_key_file: Option<PathBuf>,
    /// Freshness lifetime of a prepared request in milliseconds.
    pub lifetime_ms: u64,
    /// Tolerated client clock lead in milliseconds.
    pub clock_skew_ms: u64,
}

impl AuthSection {
    /// Freshness lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Tolerated client clock lead.
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        Duration::from_millis(self.clock_skew_ms)
    }
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            location: "latchkey".to_owned(),
            root_key: None,
            root_key_file: None,
            lifetime_ms: 5000,
            clock_skew_ms: 1000,
        }
    }
}

impl std::fmt::Debug for AuthSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSection")
            .field("location", &self.location)
            .field("has_root_key", &self.root_key.is_some())
            .field("root_key_file", &self.root_key_file)
            .field("lifetime_ms", &self.lifetime_ms)
            .field("clock_skew_ms", &self.clock_skew_ms)
            .finish()
    }
}

impl Serialize for AuthSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AuthSection", 4)?;
        state.serialize_field("location", &self.location)?;
        // root_key is intentionally omitted.
        state.serialize_field("root_key_file", &self.root_key_file)?;
        state.serialize_field("lifetime_ms", &self.lifetime_ms)?;
        state.serialize_field("clock_skew_ms", &self.clock_skew_ms)?;
        state.end()
    }
}

/// Nonce store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoncesSection {
    /// How long a used nonce is remembered in milliseconds. `0` derives
    /// lifetime plus clock skew.
    pub retention_ms: u64,
    /// Eviction period in milliseconds.
    pub sweep_interval_ms: u64,
}

impl NoncesSection {
    /// Eviction period.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for NoncesSection {
    fn default() -> Self {
        Self {
            retention_ms: 0,
            sweep_interval_ms: 1000,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["latchkey_auth=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
