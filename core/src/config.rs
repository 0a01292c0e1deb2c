//! Client configuration loaded from TOML.
//!
//! `ProxyConfig` is the file format, with every key defaulted. `PoolConfig`
//! is the derived, typed view the transport is built from.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

/// Process-wide client settings. Every key is optional in the TOML file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProxyConfig {
    #[serde(default = "default_connection_request_timeout_ms")]
    pub connection_request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
    #[serde(default = "default_pool_max_total")]
    pub pool_max_total: usize,
    #[serde(default = "default_pool_max_per_route")]
    pub pool_max_per_route: usize,
    #[serde(default = "default_connection_ttl_secs")]
    pub connection_ttl_secs: u64,
    #[serde(default = "default_validate_after_inactivity_secs")]
    pub validate_after_inactivity_secs: u64,
    #[serde(default = "default_cookie_domain")]
    pub default_cookie_domain: String,
    pub proxy: Option<ProxySettings>,
    #[serde(default)]
    pub logging: Logging,
}

/// Forward proxy every request is routed through.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
}

impl ProxySettings {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Logging {
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            path: None,
            level: default_log_level(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            connection_request_timeout_ms: default_connection_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            socket_timeout_ms: default_socket_timeout_ms(),
            pool_max_total: default_pool_max_total(),
            pool_max_per_route: default_pool_max_per_route(),
            connection_ttl_secs: default_connection_ttl_secs(),
            validate_after_inactivity_secs: default_validate_after_inactivity_secs(),
            default_cookie_domain: default_cookie_domain(),
            proxy: None,
            logging: Logging::default(),
        }
    }
}

// Defaults
fn default_connection_request_timeout_ms() -> u64 {
    1000
}
fn default_connect_timeout_ms() -> u64 {
    1000
}
fn default_socket_timeout_ms() -> u64 {
    3000
}
fn default_pool_max_total() -> usize {
    100
}
fn default_pool_max_per_route() -> usize {
    30
}
fn default_connection_ttl_secs() -> u64 {
    60
}
fn default_validate_after_inactivity_secs() -> u64 {
    30
}
fn default_cookie_domain() -> String {
    "localhost".to_string()
}
fn default_log_level() -> String {
    "WARN".to_string()
}

impl ProxyConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ProxyError> {
        Ok(toml::from_str(content)?)
    }

    /// Connection-level subset handed to the transport.
    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            connection_request_timeout: Duration::from_millis(self.connection_request_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            socket_timeout: Duration::from_millis(self.socket_timeout_ms),
            max_total: self.pool_max_total,
            max_per_route: self.pool_max_per_route,
            // ureq cannot check an idle connection, so anything idle past the
            // validation interval is dropped instead of reused.
            max_idle_age: Duration::from_secs(
                self.connection_ttl_secs.min(self.validate_after_inactivity_secs),
            ),
            proxy: self.proxy.as_ref().map(ProxySettings::url),
        }
    }
}

/// Pool and timeout settings applied uniformly to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub connection_request_timeout: Duration,
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
    pub max_total: usize,
    pub max_per_route: usize,
    pub max_idle_age: Duration,
    pub proxy: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        ProxyConfig::default().pool()
    }
}

/// Loads `path`; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ProxyError> {
    if !path.exists() {
        return Ok(ProxyConfig::default());
    }
    let content = fs::read_to_string(path)
        .map_err(|e| ProxyError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    ProxyConfig::from_toml_str(&content)
}
