//! Configuration schema definitions.
//!
//! The configuration is built once at entry, from flags and/or a TOML file,
//! and passed by reference into the route table builder. There is no
//! process-wide mutable state.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Frontend pattern to backend target, both `scheme://host[:port]/[path]`.
    pub proxy: BTreeMap<String, String>,

    /// Static certificate/key pair for TLS listeners. Accepted but unused:
    /// TLS termination is not implemented yet.
    pub tls: Option<TlsConfig>,

    /// CA material for on-the-fly certificate generation. Accepted but
    /// unused: generation is not implemented yet.
    pub ca: Option<CaConfig>,

    /// Per-server drain window on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            proxy: BTreeMap::new(),
            tls: None,
            ca: None,
            shutdown_grace_secs: 5,
        }
    }
}

/// Static certificate/key pair (PEM paths).
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// CA certificate/key pair (PEM paths).
#[derive(Debug, Clone, Deserialize)]
pub struct CaConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}
