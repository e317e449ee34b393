//! byod-ui: terminal front end for the BYOD local dashboard
//!
//! ## Commands
//!
//! - `status`, `aws`, `plugins`: read-only views
//! - `jobs`: list, inspect, retrieve and browse results
//! - `submit`: validate, upload and follow a submission
//! - `setup`: check or provision tenant infrastructure
//! - `profiles`, `config`: settings

mod cli;
mod commands;
mod output;
mod progress;

use anyhow::{Context as _, Result};
use byod_core::{ApiError, DashboardConfig};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::Context;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = auth_hint(&e) {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config =
        DashboardConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.url {
        config.base_url = url;
        config.validate()?;
    }
    debug!("Using dashboard at {}", config.base_url);

    let ctx = Context::new(config)?;
    commands::run(&ctx, cli.command).await
}

/// Re-authentication hint when the server rejected our credentials
fn auth_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(ApiError::is_auth)
        .then_some(
            "The dashboard rejected the request. Run 'byod auth login', or set api_key in ~/.byod/ui.toml (or BYOD_API_KEY).",
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_hint_found_through_context() {
        let err = anyhow::Error::new(ApiError::Auth {
            status: 401,
            detail: "Not authenticated".to_string(),
        })
        .context("Failed to list jobs");
        assert!(auth_hint(&err).unwrap().contains("byod auth login"));

        let err = anyhow::Error::new(ApiError::Status {
            status: 502,
            detail: "Failed to fetch jobs. Check your API key and network.".to_string(),
        })
        .context("Failed to list jobs");
        assert_eq!(auth_hint(&err), None);
    }
}
