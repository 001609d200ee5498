//! Service configuration loaded through the `config` crate

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Where session records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

/// Web service configuration
///
/// Every field can be overridden with a `SNIPPETBOX_`-prefixed environment
/// variable, e.g. `SNIPPETBOX_LISTEN_ADDR=127.0.0.1:8080`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to
    pub listen_addr: String,
    /// Session store backend
    pub session_backend: SessionBackend,
    /// Name of the cookie carrying the session id
    pub session_cookie_name: String,
    /// Session lifetime in seconds
    pub session_lifetime_secs: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Upper bound for a single storage call, in seconds
    pub query_timeout_secs: u64,
}

impl AppConfig {
    /// Load the configuration from defaults overlaid with the environment
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("listen_addr", "0.0.0.0:4000")?
            .set_default("session_backend", "redis")?
            .set_default("session_cookie_name", "session")?
            .set_default("session_lifetime_secs", 43_200)?
            .set_default("secure_cookies", true)?
            .set_default("query_timeout_secs", 5)?
            .add_source(Environment::with_prefix("SNIPPETBOX").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}
