//! Latchkey Telemetry - logging setup for Latchkey binaries.
//!
//! Library crates only emit `tracing` events. A binary calls
//! [`setup_logging`] once at startup to install a subscriber.
//!
//! # Example
//!
//! ```rust,no_run
//! use latchkey_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), latchkey_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("latchkey_auth=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
