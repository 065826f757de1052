//! Error handling.
//!
//! This module provides:
//! - Error type definitions for initialization, configuration and requests
//! - `StructuredError`, a composable error with ordered context fields
//! - Field rendering strategies
//! - Failure categorization and retry strategy configuration

mod categorization;
mod render;
mod structured;
mod types;

// Re-export public API
pub use categorization::{
    categorize_reqwest_error, effective_retry_limit, get_retry_strategy, is_retriable,
};
pub use render::{FieldValue, PlainRenderer, RenderHint, Renderer, TerminalRenderer};
pub use structured::{
    ErrorBuilder, ErrorField, ErrorSource, StructuredError, Update, DEFAULT_ERROR_NAME,
    FIELD_SEPARATOR,
};
pub use types::{ConfigError, HttpError, InitializationError};
