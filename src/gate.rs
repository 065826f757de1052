//! Concurrency gate for outbound transport calls.
//!
//! A gate bounds how many futures run at once. Callers past the bound suspend
//! until a permit frees up and are admitted in FIFO order.

use std::future::Future;

use log::{debug, warn};
use tokio::sync::Semaphore;

/// Admission limiter backed by a tokio semaphore.
#[derive(Debug)]
pub struct ConcurrencyGate {
    permits: Semaphore,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Creates a gate admitting `capacity` concurrent runs (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Semaphore::new(capacity),
            capacity,
        }
    }

    /// Runs `fut` once a permit is available, holding the permit until it completes.
    pub async fn run<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        if self.permits.available_permits() == 0 {
            debug!("Concurrency gate full ({} in flight), waiting", self.capacity);
        }
        let _permit = match self.permits.acquire().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                // The semaphore is never closed; run unbounded rather than fail.
                warn!("Concurrency gate closed, running without a permit");
                None
            }
        };
        fut.await
    }

    /// Maximum number of concurrent runs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
