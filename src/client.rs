//! Client façade.
//!
//! `HttpClient` owns the request dispatcher, the certificate cache and the
//! response cache. Clones share all three, so one client per process gives
//! process-wide deduplication; tests can build a fresh client each time.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::cache::{CertificateCache, ResponseCache};
use crate::dispatch::{Body, RequestDispatcher, RequestOptions};
use crate::error_handling::HttpError;
use crate::transport::{Method, ReqwestTransport, Transport, TransportResponse};

struct ClientInner {
    dispatcher: Arc<RequestDispatcher>,
    responses: ResponseCache,
}

/// Policy-aware HTTP client.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use netgate::{Configuration, HttpClient, RequestOptions};
///
/// # async fn run() -> Result<(), netgate::HttpError> {
/// let configuration = Arc::new(Configuration::default());
/// let client = HttpClient::new();
/// let options = RequestOptions::new(configuration);
///
/// let body = client.get("https://registry.example.com/pkg", &options).await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client backed by `ReqwestTransport`.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client backed by a custom transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(transport, CertificateCache::default())
    }

    pub fn with_parts(transport: Arc<dyn Transport>, certificates: CertificateCache) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                dispatcher: Arc::new(RequestDispatcher::new(transport, certificates)),
                responses: ResponseCache::new(),
            }),
        }
    }

    /// Sends a request with the method from `options`. Never cached.
    pub async fn request(
        &self,
        target: &str,
        body: impl Into<Body>,
        options: &RequestOptions,
    ) -> Result<TransportResponse, HttpError> {
        self.inner
            .dispatcher
            .dispatch(target, &body.into(), options)
            .await
    }

    /// GETs `target`, sharing one transport call among concurrent callers and
    /// reusing the body for every later call with the same target string.
    ///
    /// Failures are not cached.
    pub async fn get(&self, target: &str, options: &RequestOptions) -> Result<Bytes, HttpError> {
        let dispatcher = Arc::clone(&self.inner.dispatcher);
        let owned_target = target.to_string();
        let options = options.clone().method(Method::Get);
        self.inner
            .responses
            .get_or_fetch(target, move || async move {
                dispatcher
                    .dispatch(&owned_target, &Body::Empty, &options)
                    .await
                    .map(|response| response.body)
            })
            .await
    }

    /// Like `get`, decoding the body as JSON.
    ///
    /// Only the raw bytes are cached; they are decoded again on every call.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        target: &str,
        options: &RequestOptions,
    ) -> Result<T, HttpError> {
        let options = options.clone().json_response(true);
        let bytes = self.get(target, &options).await?;
        decode_json(&bytes)
    }

    pub async fn put(
        &self,
        target: &str,
        body: impl Into<Body>,
        options: &RequestOptions,
    ) -> Result<Bytes, HttpError> {
        self.send(Method::Put, target, body.into(), options).await
    }

    pub async fn post(
        &self,
        target: &str,
        body: impl Into<Body>,
        options: &RequestOptions,
    ) -> Result<Bytes, HttpError> {
        self.send(Method::Post, target, body.into(), options).await
    }

    pub async fn del(&self, target: &str, options: &RequestOptions) -> Result<Bytes, HttpError> {
        self.send(Method::Delete, target, Body::Empty, options).await
    }

    async fn send(
        &self,
        method: Method,
        target: &str,
        body: Body,
        options: &RequestOptions,
    ) -> Result<Bytes, HttpError> {
        let options = options.clone().method(method);
        let response = self.inner.dispatcher.dispatch(target, &body, &options).await?;
        Ok(response.body)
    }

    /// Returns true if a successful GET body for `target` is cached.
    pub fn is_cached(&self, target: &str) -> bool {
        self.inner.responses.is_cached(target)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("dispatcher", &self.inner.dispatcher)
            .field("responses", &self.inner.responses)
            .finish()
    }
}

/// Decodes a JSON response body.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice(bytes).map_err(|e| HttpError::Decode(Arc::new(e)))
}
