//! Per-destination network policy.
//!
//! This module provides:
//! - Hostname globs (`HostPattern`)
//! - Policy fragments and resolved policies
//! - The resolver merging fragments with global defaults
//! - The plaintext HTTP guard

mod glob;
mod security;
mod settings;
mod types;

pub use glob::{GlobError, HostPattern};
pub use security::check_protocol;
pub use settings::{resolve, resolve_for_host};
pub use types::{NetworkPolicy, PartialNetworkPolicy, PolicyFragment};
