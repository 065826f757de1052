//! Error type definitions.
//!
//! This module defines the error enums surfaced by initialization, configuration
//! loading and the request layer.

use std::path::PathBuf;
use std::sync::Arc;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

use super::structured::StructuredError;
use crate::network::GlobError;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or uses unknown keys.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A `networkSettings` or `unsafeHttpWhitelist` entry is not a valid glob.
    #[error("Invalid configuration: {0}")]
    InvalidGlob(#[from] GlobError),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by the request layer.
///
/// Policy violations (`NetworkDisabled`, `UnsafeProtocol`, ...) are raised
/// before any network activity. Failures reported by the transport are wrapped
/// as `Transport`, carrying the request and response context as fields.
#[derive(Error, Debug, Clone)]
pub enum HttpError {
    /// The resolved policy disables the network for this destination.
    #[error("Network access has been disabled by configuration ({target})")]
    NetworkDisabled { target: String },

    /// Plaintext HTTP to a host that is not whitelisted.
    #[error("Unsafe http requests must be explicitly whitelisted in unsafeHttpWhitelist ({host})")]
    UnsafeProtocol { host: String, target: String },

    /// Neither `http` nor `https`.
    #[error("Unsupported protocol '{scheme}' ({target})")]
    UnsupportedScheme { scheme: String, target: String },

    /// The target is not a valid absolute URL.
    #[error("Invalid URL '{target}': {source}")]
    InvalidUrl {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// A configured proxy is not a usable URL.
    #[error("Invalid proxy '{proxy}': {reason}")]
    InvalidProxy { proxy: String, reason: String },

    /// A CA bundle or client certificate could not be read.
    #[error("Failed to read certificate file {}: {source}", .path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Only one of `httpsCertFilePath` / `httpsKeyFilePath` is configured.
    #[error("Client certificates require both httpsCertFilePath and httpsKeyFilePath")]
    IncompleteClientIdentity,

    /// The transport failed; the error carries request/response context.
    #[error(transparent)]
    Transport(#[from] StructuredError),

    /// The request body could not be serialized as JSON.
    #[error("Failed to encode request body as JSON: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// The response body is not valid JSON.
    #[error("Failed to decode response body as JSON: {0}")]
    Decode(#[source] Arc<serde_json::Error>),
}

impl HttpError {
    /// The structured transport error, if this is one.
    pub fn as_structured(&self) -> Option<&StructuredError> {
        match self {
            HttpError::Transport(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true for errors raised before any transport call.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            HttpError::NetworkDisabled { .. }
                | HttpError::UnsafeProtocol { .. }
                | HttpError::UnsupportedScheme { .. }
        )
    }
}
