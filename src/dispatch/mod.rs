//! Request dispatch.
//!
//! `RequestDispatcher::dispatch` turns a target, a body and request options
//! into one transport call:
//!
//! 1. Resolve the network policy for the target host; refuse when the network
//!    is disabled for it.
//! 2. Parse the target and apply the plaintext HTTP guard.
//! 3. Pick the agent: a tunnel through the scheme's proxy, or the shared
//!    keep-alive agent for the scheme.
//! 4. Load the CA bundle and client certificate through the certificate cache.
//! 5. Encode the body and add content negotiation headers.
//! 6. Run the transport call through the `networkConcurrency` gate.
//! 7. Convert a transport failure into a structured error.

mod body;
mod failure;
mod options;

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use log::debug;
use url::Url;

pub use body::{encode, Body, EncodedBody};
pub use failure::{
    network_error, FIELD_REQUEST_METHOD, FIELD_REQUEST_REDIRECTS, FIELD_REQUEST_URL,
    FIELD_RESPONSE_CODE, FIELD_RETRY_COUNT, STATUS_FAILURE_SUMMARY, TRANSPORT_ERROR_NAME,
};
pub use options::{CustomErrorMessage, RequestOptions};

use crate::cache::CertificateCache;
use crate::config::{
    has_header, Configuration, LimitSetting, HEADER_ACCEPT, HEADER_CONTENT_TYPE, MEDIA_TYPE_JSON,
};
use crate::error_handling::HttpError;
use crate::network::{check_protocol, resolve_for_host, NetworkPolicy};
use crate::transport::{
    Agent, ProxyEndpoint, Scheme, TlsOptions, Transport, TransportRequest, TransportResponse,
};

/// Validates policy and executes requests through a `Transport`.
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
    certificates: CertificateCache,
}

impl RequestDispatcher {
    pub fn new(transport: Arc<dyn Transport>, certificates: CertificateCache) -> Self {
        Self {
            transport,
            certificates,
        }
    }

    /// Performs one request.
    ///
    /// # Errors
    ///
    /// - `HttpError::NetworkDisabled`, `UnsafeProtocol`, `UnsupportedScheme`
    ///   and `InvalidUrl` before any network activity
    /// - `HttpError::InvalidProxy`, `Certificate`, `IncompleteClientIdentity`
    ///   and `Encode` while preparing the call
    /// - `HttpError::Transport` when the transport fails
    pub async fn dispatch(
        &self,
        target: &str,
        body: &Body,
        options: &RequestOptions,
    ) -> Result<TransportResponse, HttpError> {
        let configuration = options.configuration.as_ref();

        let parsed = Url::parse(target);
        let policy = resolve_for_host(
            parsed.as_ref().ok().and_then(|url| url.host_str()),
            &configuration.network_settings,
            &configuration.defaults,
        );
        debug!("Resolved network policy for {}: {:?}", target, policy);
        if !policy.enable_network {
            return Err(HttpError::NetworkDisabled {
                target: target.to_string(),
            });
        }

        let url = parsed.map_err(|source| HttpError::InvalidUrl {
            target: target.to_string(),
            source,
        })?;
        let scheme = check_protocol(&url, &configuration.unsafe_http_whitelist)?;

        let agent = select_agent(scheme, &policy)?;
        let tls = self.tls_options(&policy, configuration).await?;

        let encoded = encode(body, options.json_request)?;
        let mut headers = options.headers.clone();
        if let Some(content_type) = encoded.as_ref().and_then(|e| e.content_type) {
            if !has_header(&headers, HEADER_CONTENT_TYPE) {
                headers.push((HEADER_CONTENT_TYPE.to_string(), content_type.to_string()));
            }
        }
        if options.json_response && !has_header(&headers, HEADER_ACCEPT) {
            headers.push((HEADER_ACCEPT.to_string(), MEDIA_TYPE_JSON.to_string()));
        }

        let request = TransportRequest {
            method: options.method,
            url,
            headers,
            body: encoded.map(|encoded| encoded.bytes),
            timeout: configuration.http_timeout,
            retry_limit: configuration.http_retry,
            agent,
            tls,
        };

        let gate = configuration.limit(LimitSetting::NetworkConcurrency);
        gate.run(self.transport.execute(request))
            .await
            .map_err(|failure| network_error(&failure, options, configuration))
    }

    async fn tls_options(
        &self,
        policy: &NetworkPolicy,
        configuration: &Configuration,
    ) -> Result<TlsOptions, HttpError> {
        let ca = match &policy.ca_file_path {
            Some(path) => Some(self.read_certificate(path).await?),
            None => None,
        };

        let identity = match (&policy.https_cert_file_path, &policy.https_key_file_path) {
            (Some(cert_path), Some(key_path)) => {
                let cert = self.read_certificate(cert_path).await?;
                let key = self.read_certificate(key_path).await?;
                let mut pem = BytesMut::with_capacity(cert.len() + key.len() + 1);
                pem.put_slice(&cert);
                if !cert.ends_with(b"\n") {
                    pem.put_u8(b'\n');
                }
                pem.put_slice(&key);
                Some(pem.freeze())
            }
            (None, None) => None,
            _ => return Err(HttpError::IncompleteClientIdentity),
        };

        Ok(TlsOptions {
            ca,
            identity,
            strict: configuration.enable_strict_ssl,
        })
    }

    async fn read_certificate(&self, path: &std::path::Path) -> Result<Bytes, HttpError> {
        self.certificates
            .get(path)
            .await
            .map_err(|source| HttpError::Certificate {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("certificates", &self.certificates)
            .finish_non_exhaustive()
    }
}

/// Chooses the connection agent for a request.
///
/// The proxy is picked by the target scheme: `httpProxy` for `http://`,
/// `httpsProxy` for `https://`.
pub fn select_agent(scheme: Scheme, policy: &NetworkPolicy) -> Result<Agent, HttpError> {
    let proxy = match scheme {
        Scheme::Http => policy.http_proxy.as_deref(),
        Scheme::Https => policy.https_proxy.as_deref(),
    };
    match proxy {
        Some(proxy) => ProxyEndpoint::parse(proxy)
            .map(Agent::Tunnel)
            .map_err(|reason| HttpError::InvalidProxy {
                proxy: proxy.to_string(),
                reason,
            }),
        None => Ok(Agent::KeepAlive(scheme)),
    }
}
