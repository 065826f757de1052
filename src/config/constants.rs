//! Configuration constants.
//!
//! This module defines the defaults and fixed operational parameters used by the
//! request layer: setting names, timeouts, retry backoff and redirect limits.

// Setting names (as they appear in configuration files and error messages)
/// Transport timeout in milliseconds
pub const HTTP_TIMEOUT_SETTING: &str = "httpTimeout";
/// Maximum number of retries handed to the transport
pub const HTTP_RETRY_SETTING: &str = "httpRetry";
/// Maximum number of simultaneous outbound transport calls
pub const NETWORK_CONCURRENCY_SETTING: &str = "networkConcurrency";

// Defaults
/// Default transport timeout (60s), matching the socket-phase timeout of most registries
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 60_000;
/// Default retry limit
pub const DEFAULT_HTTP_RETRY: u32 = 3;
/// Default concurrency gate size
pub const DEFAULT_NETWORK_CONCURRENCY: usize = 50;
/// Hosts allowed to use plaintext HTTP unless configured otherwise
pub const DEFAULT_UNSAFE_HTTP_WHITELIST: &[&str] = &["localhost"];

/// Default User-Agent string for outbound requests.
pub const DEFAULT_USER_AGENT: &str = concat!("netgate/", env!("CARGO_PKG_VERSION"));

// Network operation timeouts
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Idle time before a pooled keep-alive connection is closed
pub const KEEP_ALIVE_IDLE_SECS: u64 = 90;

// Redirect handling
/// Maximum number of redirect hops to follow
/// Prevents infinite redirect loops and excessive request chains
pub const MAX_REDIRECT_HOPS: usize = 10;

// Retry strategy
/// Delay unit in milliseconds; the first retry waits this times `RETRY_FACTOR`
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Growth rate of the retry delay between attempts
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 15;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_REQUEST_TIMEOUT: u16 = 408;
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Base URL of the status code reference linked from `Response Code` error fields
pub const STATUS_DOCS_BASE_URL: &str = "https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/";
