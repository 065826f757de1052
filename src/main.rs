//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `netgate` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing response bodies and errors
//!
//! All core functionality is implemented in the library crate.

use std::io::Write;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use netgate::config::{Cli, Command};
use netgate::initialization::{init_crypto_provider, init_logger_with};
use netgate::{Body, Configuration, HttpClient, HttpError, RequestOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows setting NETGATE_HTTPS_PROXY and friends without exporting them
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    if let Err(e) = run(cli).await {
        eprintln!("netgate error: {}", report(&e));
        process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut configuration = match &cli.config {
        Some(path) => Configuration::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    configuration.apply_overrides(&cli.overrides());

    let client = HttpClient::new();
    let options = RequestOptions::new(Arc::new(configuration))
        .json_request(cli.json)
        .json_response(cli.json);

    let body = match cli.command {
        Command::Get { url } => client.get(&url, &options).await?,
        Command::Put { url, data } => client.put(&url, payload(data, cli.json)?, &options).await?,
        Command::Post { url, data } => client.post(&url, payload(data, cli.json)?, &options).await?,
        Command::Delete { url } => client.del(&url, &options).await?,
    };

    let mut stdout = std::io::stdout().lock();
    if cli.json && !body.is_empty() {
        let value: serde_json::Value = netgate::decode_json(&body)?;
        writeln!(stdout, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        stdout.write_all(&body)?;
    }
    stdout.flush()?;
    Ok(())
}

/// `--data` as a request body; with `--json` it must be a JSON document.
fn payload(data: Option<String>, json: bool) -> Result<Body> {
    match data {
        None => Ok(Body::Empty),
        Some(text) if json => {
            let value: serde_json::Value =
                serde_json::from_str(&text).context("--data is not valid JSON")?;
            Ok(Body::Json(value))
        }
        Some(text) => Ok(Body::Text(text)),
    }
}

/// Formats a top-level error for stderr.
///
/// Transport errors already carry their context as fields, so their cause
/// chain is not appended; every other error prints its full chain.
fn report(error: &anyhow::Error) -> String {
    match error.downcast_ref::<HttpError>() {
        Some(err @ HttpError::Transport(_)) => err.to_string(),
        _ => format!("{:#}", error),
    }
}
