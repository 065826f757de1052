//! In-memory caches.
//!
//! This module provides:
//! - A generic single-flight memo
//! - The certificate file cache
//! - The GET response cache
//!
//! Entries live as long as the cache; nothing is evicted except failed loads.

mod certificate;
mod response;
mod single_flight;

pub use certificate::{CertificateCache, CertificateSource, FsCertificateSource};
pub use response::ResponseCache;
pub use single_flight::SingleFlight;
