//! Response cache for reads.
//!
//! Successful GET bodies are memoized by the literal target string. Headers and
//! content negotiation flags are not part of the key, so two reads of the same
//! target share one body even if they decode it differently.

use std::future::Future;

use bytes::Bytes;

use super::single_flight::SingleFlight;
use crate::error_handling::HttpError;

/// Single-flight cache of GET response bodies.
#[derive(Debug)]
pub struct ResponseCache {
    entries: SingleFlight<String, Bytes, HttpError>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: SingleFlight::new("response"),
        }
    }

    /// Returns the cached body for `target`, running `fetch` if there is none.
    pub async fn get_or_fetch<F, Fut>(&self, target: &str, fetch: F) -> Result<Bytes, HttpError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, HttpError>> + Send + 'static,
    {
        self.entries.get_or_load(target.to_string(), fetch).await
    }

    pub fn is_cached(&self, target: &str) -> bool {
        self.entries.is_ready(&target.to_string())
    }
}
