//! Plaintext HTTP guard.
//!
//! `https://` targets are always permitted. `http://` targets are permitted only
//! when the hostname matches one of the `unsafeHttpWhitelist` globs. Every other
//! scheme is refused, since the transport only speaks HTTP.

use url::Url;

use super::glob::HostPattern;
use crate::error_handling::HttpError;
use crate::transport::Scheme;

/// Checks that `url` may be requested, returning its scheme.
///
/// # Errors
///
/// - `HttpError::UnsafeProtocol` for `http://` to a host outside the whitelist
/// - `HttpError::UnsupportedScheme` for anything but `http` and `https`
pub fn check_protocol(url: &Url, whitelist: &[HostPattern]) -> Result<Scheme, HttpError> {
    match url.scheme() {
        "https" => Ok(Scheme::Https),
        "http" => {
            let host = url.host_str().unwrap_or_default();
            if whitelist.iter().any(|pattern| pattern.matches(host)) {
                Ok(Scheme::Http)
            } else {
                Err(HttpError::UnsafeProtocol {
                    host: host.to_string(),
                    target: url.to_string(),
                })
            }
        }
        scheme => Err(HttpError::UnsupportedScheme {
            scheme: scheme.to_string(),
            target: url.to_string(),
        }),
    }
}
