// Shared test helpers: a recording transport and configuration builders.
//
// This module provides common utilities used across multiple test files to reduce duplication.

#![allow(dead_code)] // Each test binary uses a different subset

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use netgate::transport::{TransportRequest, TransportResponse};
use netgate::{Configuration, RequestOptions, Transport, TransportFailure};

type Responder =
    Box<dyn Fn(&TransportRequest, usize) -> Result<TransportResponse, TransportFailure> + Send + Sync>;

/// A `Transport` that records every call and answers from a scripted responder.
///
/// The responder receives the request and the zero-based call number.
pub struct RecordingTransport {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    requests: Mutex<Vec<TransportRequest>>,
    responder: Responder,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new(
        responder: impl Fn(&TransportRequest, usize) -> Result<TransportResponse, TransportFailure>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            delay: None,
        }
    }

    /// Always answers 200 with `body`.
    pub fn ok(body: &'static str) -> Self {
        Self::new(move |request, _| Ok(ok_response(request, body)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests()
            .pop()
            .expect("at least one request was recorded")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.responder)(&request, call)
    }
}

/// A 200 response for `request` carrying `body`.
pub fn ok_response(request: &TransportRequest, body: &'static str) -> TransportResponse {
    TransportResponse {
        status: 200,
        url: request.url.clone(),
        headers: Vec::new(),
        body: Bytes::from_static(body.as_bytes()),
    }
}

/// Parses a JSON configuration document, panicking on invalid test input.
pub fn configuration(json: &str) -> Arc<Configuration> {
    Arc::new(Configuration::from_json_str(json).expect("valid test configuration"))
}

/// Request options over a configuration document.
pub fn options(json: &str) -> RequestOptions {
    RequestOptions::new(configuration(json))
}
