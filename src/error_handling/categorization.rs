//! Failure categorization and retry strategy.
//!
//! This module classifies transport failures and decides which ones are worth
//! retrying.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use crate::config::{HTTP_STATUS_REQUEST_TIMEOUT, HTTP_STATUS_TOO_MANY_REQUESTS};
use crate::transport::{FailureKind, Method, TimeoutPhase, TransportFailure};

/// Creates an exponential backoff retry strategy.
///
/// Delays start at `RETRY_INITIAL_DELAY_MS * RETRY_FACTOR` and double with each
/// retry (1s, 2s, 4s, ...), capped at `RETRY_MAX_DELAY_SECS`. At most
/// `retry_limit` delays are produced, one per retry after the first attempt.
pub fn get_retry_strategy(retry_limit: u32) -> impl Iterator<Item = Duration> {
    // tokio-retry computes `factor * base^n`: the base is the growth rate
    ExponentialBackoff::from_millis(crate::config::RETRY_FACTOR)
        .factor(crate::config::RETRY_INITIAL_DELAY_MS)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .take(retry_limit as usize)
}

/// Retry limit actually applied to a request.
///
/// Non-idempotent verbs (POST) are never re-sent.
pub fn effective_retry_limit(method: Method, retry_limit: u32) -> u32 {
    if method.is_idempotent() {
        retry_limit
    } else {
        0
    }
}

/// Determines if a transport failure is retriable (should be retried).
///
/// # Retriable
///
/// - Timeouts and connection failures
/// - 408 Request Timeout and 429 Too Many Requests
/// - Server errors (5xx)
///
/// # Non-Retriable
///
/// - Client errors (4xx other than 408 and 429)
/// - Redirect loops and body read errors
pub fn is_retriable(failure: &TransportFailure) -> bool {
    if let Some(response) = &failure.response {
        let status = response.status;
        if status == HTTP_STATUS_REQUEST_TIMEOUT || status == HTTP_STATUS_TOO_MANY_REQUESTS {
            return true;
        }
        if (400..500).contains(&status) {
            return false;
        }
        if (500..600).contains(&status) {
            return true;
        }
    }

    match failure.kind {
        FailureKind::Timeout(_) | FailureKind::Connect => true,
        FailureKind::Redirect | FailureKind::Body => false,
        // Default: retry unknown errors (might be transient network issue)
        FailureKind::Status | FailureKind::Other => true,
    }
}

/// Categorizes a `reqwest::Error` into a `FailureKind`.
///
/// Connect-phase timeouts are reported by reqwest as both `is_connect()` and
/// `is_timeout()`; they are told apart from socket timeouts here.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        if error.is_connect() {
            FailureKind::Timeout(TimeoutPhase::Connect)
        } else {
            FailureKind::Timeout(TimeoutPhase::Socket)
        }
    } else if error.is_connect() {
        FailureKind::Connect
    } else if error.is_status() {
        FailureKind::Status
    } else if error.is_redirect() {
        FailureKind::Redirect
    } else if error.is_body() || error.is_decode() {
        FailureKind::Body
    } else {
        FailureKind::Other
    }
}
