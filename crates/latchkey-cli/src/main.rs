//! Latchkey CLI - issue, prepare and verify macaroon tokens.
//!
//! The issuer side (`issue`, `verify`) reads the root key from config. The
//! client side (`prepare`) only needs an issued token.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;
mod theme;

use commands::{inspect, issue, keygen, prepare, verify};

/// Latchkey - macaroon tokens with replay protection
#[derive(Parser)]
#[command(name = "latchkey")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "LATCHKEY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new root key
    Keygen {
        /// Write the key to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Issue a token for a subject
    Issue {
        /// Numeric subject id
        #[arg(short, long)]
        subject: u32,

        /// Operations the token may not perform (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        disable: Vec<String>,
    },

    /// Add a nonce and the current time to an issued token
    Prepare {
        /// Issued token (hex)
        token: String,

        /// Nonce to use; defaults to one derived from the clock
        #[arg(short, long, allow_hyphen_values = true)]
        nonce: Option<i64>,

        /// Print as an Authorization header value
        #[arg(long)]
        header: bool,
    },

    /// Verify a prepared token, or one token per line with `-`
    Verify {
        /// Prepared token (hex or `Macaroon <hex>`), or `-` for stdin
        token: String,

        /// Also require that the token permits this operation
        #[arg(short, long)]
        operation: Option<String>,
    },

    /// Show the contents of a token without verifying it
    Inspect {
        /// Token (hex)
        token: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = latchkey_config::Config::load(cli.config.as_deref())?;
    let config = resolved.config;

    let log_config = config_bridge::to_log_config(&config, cli.verbose);
    if let Err(e) = latchkey_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }
    for path in &resolved.loaded_files {
        tracing::debug!(path, "config file in effect");
    }

    match cli.command {
        Commands::Keygen { output } => keygen::run_keygen(output.as_deref()),
        Commands::Issue { subject, disable } => issue::run_issue(&config, subject, &disable),
        Commands::Prepare {
            token,
            nonce,
            header,
        } => prepare::run_prepare(&token, nonce, header),
        Commands::Verify { token, operation } => {
            verify::run_verify(&config, &token, operation.as_deref()).await
        },
        Commands::Inspect { token, json } => inspect::run_inspect(&token, json),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_disable_list_split() {
        let cli = Cli::parse_from(["latchkey", "issue", "--subject", "100", "--disable", "a,b"]);
        match cli.command {
            Commands::Issue { subject, disable } => {
                assert_eq!(subject, 100);
                assert_eq!(disable, vec!["a", "b"]);
            },
            _ => panic!("expected issue"),
        }
    }

    #[test]
    fn test_negative_nonce_accepted() {
        let cli = Cli::parse_from(["latchkey", "prepare", "abcd", "--nonce", "-5"]);
        assert!(matches!(
            cli.command,
            Commands::Prepare {
                nonce: Some(-5),
                ..
            }
        ));
    }
}
