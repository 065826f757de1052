//! Transport request, response and failure types.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use url::Url;

/// HTTP verbs issued by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Put,
    Post,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl Method {
    /// True for verbs that can be repeated without changing the outcome.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Method::Post)
    }
}

/// Target URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

/// Proxy location extracted from a proxy URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    pub host: String,
    /// `None` leaves the port to the transport default
    pub port: Option<u16>,
}

impl ProxyEndpoint {
    /// Extracts `{host, port}` from a proxy URL such as `http://proxy:8080`.
    pub fn parse(proxy: &str) -> Result<Self, String> {
        let url = Url::parse(proxy).map_err(|e| e.to_string())?;
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| "proxy URL has no host".to_string())?;
        Ok(Self {
            host: host.to_string(),
            port: url.port(),
        })
    }

    /// URL handed to the HTTP client when tunnelling through this proxy.
    pub fn to_url(&self) -> String {
        match self.port {
            Some(port) => format!("http://{}:{}", self.host, port),
            None => format!("http://{}", self.host),
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// Connection strategy for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Agent {
    /// The shared keep-alive agent for the scheme
    KeepAlive(Scheme),
    /// A tunnelling agent through a proxy
    Tunnel(ProxyEndpoint),
}

/// TLS trust and identity material for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TlsOptions {
    /// Additional PEM trust anchors
    pub ca: Option<Bytes>,
    /// PEM client certificate followed by its private key
    pub identity: Option<Bytes>,
    /// Verify server certificates
    pub strict: bool,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            ca: None,
            identity: None,
            strict: true,
        }
    }
}

/// Everything the transport needs to perform one logical request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub timeout: Duration,
    /// Retries allowed after the first attempt
    pub retry_limit: u32,
    pub agent: Agent,
    pub tls: TlsOptions,
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Final URL after redirects
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Which phase a timeout hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    Connect,
    Socket,
}

/// Broad classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout(TimeoutPhase),
    Connect,
    /// A response arrived with a non-success status
    Status,
    Redirect,
    Body,
    Other,
}

/// The request that was actually put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedRequest {
    pub method: Method,
    pub url: String,
}

/// A response received before the request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FailedResponse {
    /// Canonical reason phrase for the status code, if any.
    pub fn reason(&self) -> Option<&'static str> {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
    }
}

/// A failure reported by the transport, with whatever context it gathered.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
    pub request: Option<IssuedRequest>,
    /// Redirect targets followed before the failure
    pub redirect_urls: Vec<String>,
    /// Retries performed, excluding the first attempt
    pub retry_count: u32,
    pub response: Option<FailedResponse>,
}

impl TransportFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            request: None,
            redirect_urls: Vec::new(),
            retry_count: 0,
            response: None,
        }
    }

    pub fn with_request(mut self, method: Method, url: impl Into<String>) -> Self {
        self.request = Some(IssuedRequest {
            method,
            url: url.into(),
        });
        self
    }

    pub fn with_redirects(mut self, redirect_urls: Vec<String>) -> Self {
        self.redirect_urls = redirect_urls;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_response(mut self, status: u16, body: impl Into<Bytes>) -> Self {
        self.response = Some(FailedResponse {
            status,
            body: body.into(),
        });
        self
    }

    /// Returns true for timeouts hit while waiting on an established socket.
    pub fn is_socket_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout(TimeoutPhase::Socket)
    }
}

/// The HTTP transport collaborator.
///
/// Implementations own connection handling, TLS, redirects and retry timing;
/// the request layer only decides what policy to hand them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs `request`, retrying up to `request.retry_limit` times.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportFailure>;
}
