//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (setting names, defaults, timeouts)
//! - HTTP header name constants
//! - The on-disk JSON format and the resolved `Configuration`
//! - CLI option types and parsing

mod constants;
mod file;
mod headers;
mod settings;
mod types;

// Re-export all constants
pub use constants::*;
pub use file::{ConfigFile, OrderedNetworkSettings};
pub use headers::*;
pub use settings::{Configuration, LimitSetting};
pub use types::{Cli, Command, LogFormat, LogLevel, Overrides};
