//! netgate library: a policy-driven HTTP request layer
//!
//! This library resolves per-destination network policy from layered
//! configuration, enforces safety rules (network kill-switch, plaintext HTTP
//! whitelist), executes requests through a bounded concurrency gate with
//! proxying, TLS trust, timeouts and retries, deduplicates identical in-flight
//! reads, and reports transport failures as structured, context-rich errors.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use netgate::{Configuration, HttpClient, RequestOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let configuration = Configuration::from_json_str(r#"{
//!     "networkSettings": {
//!         "*.example.com": { "httpsProxy": "http://proxy:8080" }
//!     },
//!     "httpRetry": 1
//! }"#)?;
//!
//! let client = HttpClient::new();
//! let options = RequestOptions::new(Arc::new(configuration));
//! let manifest: serde_json::Value = client
//!     .get_json("https://registry.example.com/pkg", &options)
//!     .await?;
//! println!("{}", manifest["name"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod cache;
mod client;
pub mod config;
pub mod dispatch;
pub mod error_handling;
pub mod gate;
pub mod initialization;
pub mod network;
pub mod transport;

// Re-export public API
pub use client::{decode_json, HttpClient};
pub use config::{Configuration, LimitSetting, LogFormat, LogLevel};
pub use dispatch::{Body, RequestDispatcher, RequestOptions};
pub use error_handling::{ConfigError, ErrorBuilder, HttpError, StructuredError};
pub use network::NetworkPolicy;
pub use transport::{Method, ReqwestTransport, Transport, TransportFailure, TransportResponse};
