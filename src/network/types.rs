//! Network policy types.

use std::path::PathBuf;

use serde::Deserialize;

use super::glob::{GlobError, HostPattern};

/// Network settings as written for one host pattern; every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialNetworkPolicy {
    pub enable_network: Option<bool>,
    pub ca_file_path: Option<PathBuf>,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub https_cert_file_path: Option<PathBuf>,
    pub https_key_file_path: Option<PathBuf>,
}

/// Network settings resolved for one destination.
///
/// The optional fields are "defined" in the sense that their value has been
/// decided: `None` means the resolved policy carries no proxy, CA bundle or
/// client certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPolicy {
    pub enable_network: bool,
    pub ca_file_path: Option<PathBuf>,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub https_cert_file_path: Option<PathBuf>,
    pub https_key_file_path: Option<PathBuf>,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            enable_network: true,
            ca_file_path: None,
            http_proxy: None,
            https_proxy: None,
            https_cert_file_path: None,
            https_key_file_path: None,
        }
    }
}

/// A host pattern paired with the settings it scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyFragment {
    pub pattern: HostPattern,
    pub settings: PartialNetworkPolicy,
}

impl PolicyFragment {
    /// Compiles `glob` and pairs it with `settings`.
    pub fn new(glob: &str, settings: PartialNetworkPolicy) -> Result<Self, GlobError> {
        Ok(Self {
            pattern: HostPattern::new(glob)?,
            settings,
        })
    }
}
