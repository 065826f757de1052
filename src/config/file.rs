//! On-disk configuration format.
//!
//! Configuration files are JSON documents using camelCase keys. The
//! `networkSettings` object is read in document order, which is the tie-break
//! order used when two host patterns are equally specific.

use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::network::PartialNetworkPolicy;

/// Raw contents of a configuration file, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub network_settings: OrderedNetworkSettings,
    pub enable_network: Option<bool>,
    pub ca_file_path: Option<PathBuf>,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub https_cert_file_path: Option<PathBuf>,
    pub https_key_file_path: Option<PathBuf>,
    pub http_timeout: Option<u64>,
    pub http_retry: Option<u32>,
    pub enable_strict_ssl: Option<bool>,
    pub unsafe_http_whitelist: Option<Vec<String>>,
    pub network_concurrency: Option<usize>,
    pub enable_colors: Option<bool>,
    pub enable_hyperlinks: Option<bool>,
}

/// `networkSettings` entries in the order they appear in the document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OrderedNetworkSettings(pub Vec<(String, PartialNetworkPolicy)>);

impl<'de> Deserialize<'de> for OrderedNetworkSettings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedNetworkSettings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping host globs to network settings")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((pattern, settings)) =
                    map.next_entry::<String, PartialNetworkPolicy>()?
                {
                    entries.push((pattern, settings));
                }
                Ok(OrderedNetworkSettings(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
