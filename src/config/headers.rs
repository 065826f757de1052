//! HTTP header name and value constants.
//!
//! Header names are lowercase so they compare equal to the names reqwest and
//! hyper report back.

/// Request payload media type
pub const HEADER_CONTENT_TYPE: &str = "content-type";
/// Response media types the caller is willing to decode
pub const HEADER_ACCEPT: &str = "accept";
/// Redirect target
pub const HEADER_LOCATION: &str = "location";

/// Media type sent with JSON payloads and requested for JSON responses
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// Returns true if `headers` already carries `name` (case-insensitive).
pub fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers
        .iter()
        .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
}
