//! reqwest-backed transport.
//!
//! One `reqwest::Client` is kept per agent and TLS configuration, so the two
//! keep-alive agents (one per scheme) and every tunnelling agent reuse their
//! pooled connections for the lifetime of the transport. Redirects are followed
//! by hand to record the chain; retries use `tokio-retry` with exponential
//! backoff.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use tokio_retry::RetryIf;

use super::types::{
    Agent, FailureKind, Method, TlsOptions, Transport, TransportFailure, TransportRequest,
    TransportResponse,
};
use crate::config::{DEFAULT_USER_AGENT, HEADER_CONTENT_TYPE, HEADER_LOCATION, MAX_REDIRECT_HOPS};
use crate::error_handling::{
    categorize_reqwest_error, effective_retry_limit, get_retry_strategy, is_retriable,
};
use crate::initialization::build_client;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    agent: Agent,
    tls: TlsOptions,
}

/// The default `Transport`, built on reqwest and rustls.
#[derive(Debug)]
pub struct ReqwestTransport {
    clients: Mutex<HashMap<ClientKey, reqwest::Client>>,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct agents created so far.
    pub fn agent_count(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn client(&self, agent: &Agent, tls: &TlsOptions) -> Result<reqwest::Client, TransportFailure> {
        let key = ClientKey {
            agent: agent.clone(),
            tls: tls.clone(),
        };
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }
        let client = build_client(agent, tls, DEFAULT_USER_AGENT).map_err(|e| {
            TransportFailure::new(
                FailureKind::Other,
                format!("Failed to configure HTTP client: {}", error_chain(&e)),
            )
        })?;
        clients.insert(key, client.clone());
        Ok(client)
    }

    async fn attempt(
        &self,
        client: &reqwest::Client,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportFailure> {
        let mut method = request.method;
        let mut body = request.body.clone();
        let mut current = request.url.clone();
        let mut redirects: Vec<String> = Vec::new();

        loop {
            debug!("{} {}", method, current);
            let mut builder = client
                .request(method.into(), current.clone())
                .timeout(request.timeout);
            for (name, value) in &request.headers {
                if body.is_none() && name.eq_ignore_ascii_case(HEADER_CONTENT_TYPE) {
                    continue;
                }
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(payload) = &body {
                builder = builder.body(payload.clone());
            }

            let response = builder.send().await.map_err(|e| {
                TransportFailure::new(categorize_reqwest_error(&e), error_chain(&e))
                    .with_request(method, current.as_str())
                    .with_redirects(redirects.clone())
            })?;

            let status = response.status();
            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(HEADER_LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(|value| value.to_string());
                if let Some(location) = location {
                    if redirects.len() >= MAX_REDIRECT_HOPS {
                        return Err(TransportFailure::new(
                            FailureKind::Redirect,
                            format!("Too many redirects (more than {})", MAX_REDIRECT_HOPS),
                        )
                        .with_request(method, current.as_str())
                        .with_redirects(redirects));
                    }
                    let next = current.join(&location).map_err(|e| {
                        TransportFailure::new(
                            FailureKind::Redirect,
                            format!("Invalid redirect location '{}': {}", location, e),
                        )
                        .with_request(method, current.as_str())
                        .with_redirects(redirects.clone())
                    })?;
                    if status == StatusCode::SEE_OTHER
                        || (method == Method::Post
                            && (status == StatusCode::MOVED_PERMANENTLY
                                || status == StatusCode::FOUND))
                    {
                        method = Method::Get;
                        body = None;
                    }
                    debug!("Following {} redirect to {}", status.as_u16(), next);
                    redirects.push(next.to_string());
                    current = next;
                    continue;
                }
                warn!(
                    "Redirect status {} for {} but no Location header",
                    status.as_u16(),
                    current
                );
            }

            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let bytes = response.bytes().await.map_err(|e| {
                TransportFailure::new(categorize_reqwest_error(&e), error_chain(&e))
                    .with_request(method, current.as_str())
                    .with_redirects(redirects.clone())
            })?;

            if !status.is_success() {
                let message = match status.canonical_reason() {
                    Some(reason) => format!("Response code {} ({})", status.as_u16(), reason),
                    None => format!("Response code {}", status.as_u16()),
                };
                return Err(TransportFailure::new(FailureKind::Status, message)
                    .with_request(method, current.as_str())
                    .with_redirects(redirects)
                    .with_response(status.as_u16(), bytes));
            }

            return Ok(TransportResponse {
                status: status.as_u16(),
                url: current,
                headers,
                body: bytes,
            });
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportFailure> {
        let client = self.client(&request.agent, &request.tls)?;
        let attempts = AtomicU32::new(0);

        let retry_limit = effective_retry_limit(request.method, request.retry_limit);
        let result = RetryIf::start(
            get_retry_strategy(retry_limit),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.attempt(&client, &request)
            },
            |failure: &TransportFailure| {
                let retry = is_retriable(failure);
                if retry {
                    warn!(
                        "Retrying {} {} after failure: {}",
                        request.method, request.url, failure
                    );
                }
                retry
            },
        )
        .await;

        let retry_count = attempts.load(Ordering::SeqCst).saturating_sub(1);
        result.map_err(|failure| failure.with_retry_count(retry_count))
    }
}

/// Joins an error with its sources, the way `{:#}` does for anyhow errors.
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
