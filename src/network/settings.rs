//! Per-destination network policy resolution.
//!
//! Fragments are ranked by pattern length, longest first, with configuration
//! order breaking ties. Each key is then resolved on its own: the first ranked
//! fragment that matches the host *and* defines the key supplies its value,
//! otherwise the global default applies. A host can therefore take its proxy
//! from one pattern and `enableNetwork` from another, less specific one.

use log::debug;
use url::Url;

use super::types::{NetworkPolicy, PolicyFragment};

/// Resolves the policy for `target` (a URL string).
///
/// Targets that do not parse, or have no host, match no pattern and resolve to
/// the global defaults.
pub fn resolve(target: &str, fragments: &[PolicyFragment], defaults: &NetworkPolicy) -> NetworkPolicy {
    let host = Url::parse(target)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.to_string()));
    resolve_for_host(host.as_deref(), fragments, defaults)
}

/// Resolves the policy for an already extracted hostname.
pub fn resolve_for_host(
    host: Option<&str>,
    fragments: &[PolicyFragment],
    defaults: &NetworkPolicy,
) -> NetworkPolicy {
    let Some(host) = host else {
        return defaults.clone();
    };

    // sort_by_key is stable, so equal lengths keep configuration order
    let mut ranked: Vec<&PolicyFragment> = fragments
        .iter()
        .filter(|fragment| fragment.pattern.matches(host))
        .collect();
    ranked.sort_by_key(|fragment| std::cmp::Reverse(fragment.pattern.specificity()));

    if !ranked.is_empty() {
        debug!(
            "Host {} matched network setting pattern(s): {}",
            host,
            ranked
                .iter()
                .map(|fragment| fragment.pattern.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    macro_rules! pick {
        ($key:ident) => {
            ranked
                .iter()
                .find_map(|fragment| fragment.settings.$key.clone())
        };
    }

    NetworkPolicy {
        enable_network: pick!(enable_network).unwrap_or(defaults.enable_network),
        ca_file_path: pick!(ca_file_path).or_else(|| defaults.ca_file_path.clone()),
        http_proxy: pick!(http_proxy).or_else(|| defaults.http_proxy.clone()),
        https_proxy: pick!(https_proxy).or_else(|| defaults.https_proxy.clone()),
        https_cert_file_path: pick!(https_cert_file_path)
            .or_else(|| defaults.https_cert_file_path.clone()),
        https_key_file_path: pick!(https_key_file_path)
            .or_else(|| defaults.https_key_file_path.clone()),
    }
}
