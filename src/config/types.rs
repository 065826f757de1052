//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and for layering explicit overrides on top of a configuration file.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Explicit overrides applied on top of the configuration file.
///
/// Every field is optional; `None` leaves the file (or built-in default) value
/// untouched. The CLI fills this from flags and `NETGATE_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub enable_network: Option<bool>,
    pub ca_file_path: Option<PathBuf>,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub http_timeout_ms: Option<u64>,
    pub http_retry: Option<u32>,
    pub enable_strict_ssl: Option<bool>,
    pub network_concurrency: Option<usize>,
}

/// Command-line options.
///
/// This struct is automatically generated by `clap` from the field attributes.
/// Network options can also be supplied through `NETGATE_*` environment
/// variables (a `.env` file next to the working directory is honoured).
///
/// # Examples
///
/// ```bash
/// # Fetch a document using the settings from a configuration file
/// netgate --config netgate.json get https://registry.example.com/pkg
///
/// # Post a JSON payload with a shorter timeout and no retries
/// netgate --http-timeout 5000 --http-retry 0 post https://api.example.com/items --data '{"a":1}'
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "netgate",
    about = "Sends HTTP requests through per-host network policy, proxies and TLS settings."
)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, short, env = "NETGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Transport timeout in milliseconds
    #[arg(long, env = "NETGATE_HTTP_TIMEOUT")]
    pub http_timeout: Option<u64>,

    /// Number of retries for failed requests
    #[arg(long, env = "NETGATE_HTTP_RETRY")]
    pub http_retry: Option<u32>,

    /// Maximum number of simultaneous requests
    #[arg(long, env = "NETGATE_NETWORK_CONCURRENCY")]
    pub network_concurrency: Option<usize>,

    /// Proxy used for plaintext http:// targets
    #[arg(long, env = "NETGATE_HTTP_PROXY")]
    pub http_proxy: Option<String>,

    /// Proxy used for https:// targets
    #[arg(long, env = "NETGATE_HTTPS_PROXY")]
    pub https_proxy: Option<String>,

    /// Additional trusted CA bundle (PEM)
    #[arg(long, env = "NETGATE_CA_FILE_PATH")]
    pub ca_file_path: Option<PathBuf>,

    /// Refuse every outbound request
    #[arg(long)]
    pub no_network: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Send and pretty-print JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// HTTP verb selected on the command line.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// GET a resource
    Get {
        /// Target URL
        url: String,
    },
    /// PUT a payload
    Put {
        /// Target URL
        url: String,
        /// Request payload
        #[arg(long)]
        data: Option<String>,
    },
    /// POST a payload
    Post {
        /// Target URL
        url: String,
        /// Request payload
        #[arg(long)]
        data: Option<String>,
    },
    /// DELETE a resource
    Delete {
        /// Target URL
        url: String,
    },
}

impl Cli {
    /// Collects the overrides expressed by flags and environment variables.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            enable_network: self.no_network.then_some(false),
            ca_file_path: self.ca_file_path.clone(),
            http_proxy: self.http_proxy.clone(),
            https_proxy: self.https_proxy.clone(),
            http_timeout_ms: self.http_timeout,
            http_retry: self.http_retry,
            enable_strict_ssl: self.insecure.then_some(false),
            network_concurrency: self.network_concurrency,
        }
    }
}
