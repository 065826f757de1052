//! HTTP transport.
//!
//! This module provides:
//! - The `Transport` trait the request layer dispatches through
//! - Request, response and failure types
//! - `ReqwestTransport`, the default implementation

mod engine;
mod types;

pub use engine::ReqwestTransport;
pub use types::{
    Agent, FailedResponse, FailureKind, IssuedRequest, Method, ProxyEndpoint, Scheme,
    TimeoutPhase, TlsOptions, Transport, TransportFailure, TransportRequest, TransportResponse,
};
