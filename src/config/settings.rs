//! Resolved configuration.
//!
//! `Configuration` is the read interface the request layer consumes: global
//! network defaults, ordered per-host policy fragments, transport policy and the
//! concurrency limits keyed by setting name.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::debug;

use super::constants::{
    DEFAULT_HTTP_RETRY, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_NETWORK_CONCURRENCY,
    DEFAULT_UNSAFE_HTTP_WHITELIST, NETWORK_CONCURRENCY_SETTING,
};
use super::file::ConfigFile;
use super::types::Overrides;
use crate::error_handling::{ConfigError, Renderer, TerminalRenderer};
use crate::gate::ConcurrencyGate;
use crate::network::{HostPattern, NetworkPolicy, PolicyFragment};

/// Settings that are backed by a concurrency gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitSetting {
    /// Bounds simultaneous outbound transport calls
    NetworkConcurrency,
}

impl LimitSetting {
    /// Name of the setting in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitSetting::NetworkConcurrency => NETWORK_CONCURRENCY_SETTING,
        }
    }
}

/// Fully resolved configuration.
///
/// Cloning is cheap enough for per-request use; every clone shares the same
/// concurrency gates, so a gate bounds all requests made with any clone.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Host-scoped policy fragments, in configuration order
    pub network_settings: Vec<PolicyFragment>,
    /// Global defaults used when no fragment defines a key
    pub defaults: NetworkPolicy,
    /// Transport timeout
    pub http_timeout: Duration,
    /// Retry limit handed to the transport
    pub http_retry: u32,
    /// Verify TLS certificates
    pub enable_strict_ssl: bool,
    /// Hosts allowed to use plaintext HTTP
    pub unsafe_http_whitelist: Vec<HostPattern>,
    /// Size of the `networkConcurrency` gate
    pub network_concurrency: usize,
    /// Colorize rendered error fields
    pub enable_colors: bool,
    /// Emit terminal hyperlinks in rendered error fields
    pub enable_hyperlinks: bool,
    limits: Arc<Mutex<HashMap<LimitSetting, Arc<ConcurrencyGate>>>>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            network_settings: Vec::new(),
            defaults: NetworkPolicy::default(),
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            http_retry: DEFAULT_HTTP_RETRY,
            enable_strict_ssl: true,
            unsafe_http_whitelist: DEFAULT_UNSAFE_HTTP_WHITELIST
                .iter()
                .filter_map(|glob| HostPattern::new(glob).ok())
                .collect(),
            network_concurrency: DEFAULT_NETWORK_CONCURRENCY,
            enable_colors: false,
            enable_hyperlinks: false,
            limits: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Configuration {
    /// Loads a JSON configuration file on top of the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid JSON, uses
    /// unknown keys, or contains an invalid host glob.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let configuration = Self::from_json_str(&content)?;
        debug!(
            "Loaded configuration from {} ({} network setting pattern(s))",
            path.display(),
            configuration.network_settings.len()
        );
        Ok(configuration)
    }

    /// Parses a JSON configuration document on top of the built-in defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(content)?;
        Self::from_config_file(file)
    }

    /// Validates a parsed configuration file.
    pub fn from_config_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut configuration = Self::default();

        configuration.network_settings = file
            .network_settings
            .0
            .into_iter()
            .map(|(glob, settings)| PolicyFragment::new(&glob, settings))
            .collect::<Result<_, _>>()?;

        let defaults = &mut configuration.defaults;
        if let Some(enable_network) = file.enable_network {
            defaults.enable_network = enable_network;
        }
        defaults.ca_file_path = file.ca_file_path;
        defaults.http_proxy = file.http_proxy;
        defaults.https_proxy = file.https_proxy;
        defaults.https_cert_file_path = file.https_cert_file_path;
        defaults.https_key_file_path = file.https_key_file_path;

        if let Some(timeout) = file.http_timeout {
            configuration.http_timeout = Duration::from_millis(timeout);
        }
        if let Some(retry) = file.http_retry {
            configuration.http_retry = retry;
        }
        if let Some(strict) = file.enable_strict_ssl {
            configuration.enable_strict_ssl = strict;
        }
        if let Some(whitelist) = file.unsafe_http_whitelist {
            configuration.unsafe_http_whitelist = whitelist
                .iter()
                .map(|glob| HostPattern::new(glob))
                .collect::<Result<_, _>>()?;
        }
        if let Some(concurrency) = file.network_concurrency {
            if concurrency == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be at least 1",
                    NETWORK_CONCURRENCY_SETTING
                )));
            }
            configuration.network_concurrency = concurrency;
        }
        if let Some(colors) = file.enable_colors {
            configuration.enable_colors = colors;
        }
        if let Some(hyperlinks) = file.enable_hyperlinks {
            configuration.enable_hyperlinks = hyperlinks;
        }

        Ok(configuration)
    }

    /// Applies explicit overrides (CLI flags, environment variables).
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(enable_network) = overrides.enable_network {
            self.defaults.enable_network = enable_network;
        }
        if let Some(path) = &overrides.ca_file_path {
            self.defaults.ca_file_path = Some(path.clone());
        }
        if let Some(proxy) = &overrides.http_proxy {
            self.defaults.http_proxy = Some(proxy.clone());
        }
        if let Some(proxy) = &overrides.https_proxy {
            self.defaults.https_proxy = Some(proxy.clone());
        }
        if let Some(timeout) = overrides.http_timeout_ms {
            self.http_timeout = Duration::from_millis(timeout);
        }
        if let Some(retry) = overrides.http_retry {
            self.http_retry = retry;
        }
        if let Some(strict) = overrides.enable_strict_ssl {
            self.enable_strict_ssl = strict;
        }
        if let Some(concurrency) = overrides.network_concurrency {
            self.network_concurrency = concurrency.max(1);
        }
    }

    /// Returns the concurrency gate backing `setting`, creating it on first use.
    ///
    /// The gate is sized from the setting's value at creation time and shared by
    /// every clone of this configuration.
    pub fn limit(&self, setting: LimitSetting) -> Arc<ConcurrencyGate> {
        let mut limits = self.limits.lock().unwrap_or_else(PoisonError::into_inner);
        let gate = limits.entry(setting).or_insert_with(|| {
            let capacity = match setting {
                LimitSetting::NetworkConcurrency => self.network_concurrency,
            };
            debug!("Creating {} gate with {} permit(s)", setting.as_str(), capacity);
            Arc::new(ConcurrencyGate::new(capacity))
        });
        Arc::clone(gate)
    }

    /// Formatting strategy used when rendering error fields for this configuration.
    pub fn renderer(&self) -> Arc<dyn Renderer> {
        Arc::new(TerminalRenderer::new(self.enable_colors, self.enable_hyperlinks))
    }
}
