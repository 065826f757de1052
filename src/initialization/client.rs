//! HTTP client initialization.
//!
//! This module builds the `reqwest::Client` behind each transport agent. Every
//! client has automatic redirects disabled so the transport can track the
//! redirect chain itself.

use std::time::Duration;

use log::debug;
use reqwest::{Certificate, ClientBuilder, Identity, Proxy};

use crate::config::{KEEP_ALIVE_IDLE_SECS, TCP_CONNECT_TIMEOUT_SECS};
use crate::transport::{Agent, TlsOptions};

/// Initializes an HTTP client for one agent and TLS configuration.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header
/// - Redirect following disabled (tracked manually)
/// - TCP keep-alive and pooled idle connections
/// - A proxy for tunnelling agents, no proxy at all otherwise
/// - The trust anchors and client identity from `tls`
///
/// Per-request timeouts are applied by the transport, not here.
///
/// # Errors
///
/// Returns a `reqwest::Error` if a certificate or identity cannot be parsed,
/// the proxy URL is invalid, or client creation fails.
pub fn build_client(
    agent: &Agent,
    tls: &TlsOptions,
    user_agent: &str,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(KEEP_ALIVE_IDLE_SECS))
        .tcp_keepalive(Duration::from_secs(KEEP_ALIVE_IDLE_SECS))
        .user_agent(user_agent)
        .danger_accept_invalid_certs(!tls.strict)
        .tls_built_in_root_certs(uses_built_in_roots(tls));

    builder = match agent {
        Agent::KeepAlive(_) => builder.no_proxy(),
        Agent::Tunnel(endpoint) => builder.proxy(Proxy::all(endpoint.to_url())?),
    };

    if let Some(ca) = &tls.ca {
        for certificate in Certificate::from_pem_bundle(ca)? {
            builder = builder.add_root_certificate(certificate);
        }
    }
    if let Some(identity) = &tls.identity {
        builder = builder.identity(Identity::from_pem(identity)?);
    }

    debug!(
        "Building HTTP client for {:?} (strict TLS: {}, custom CA: {}, client identity: {})",
        agent,
        tls.strict,
        tls.ca.is_some(),
        tls.identity.is_some()
    );
    builder.build()
}

/// A configured CA bundle replaces the built-in roots instead of extending them.
pub fn uses_built_in_roots(tls: &TlsOptions) -> bool {
    tls.ca.is_none()
}
