//! Gateway configuration types.
//!
//! The service reads one JSON document (path from `CONFIG_PATH`, default
//! `tessera.json`). `LISTEN_ADDR` and `DATA_DIR` override the matching
//! fields when set.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use tessera_auth::{KeyConfig, TokenConfig};
use tessera_login::ProviderConfig;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration document.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for the HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Public base URL of this service, used to build provider callback URLs.
    #[serde(default = "GatewayConfig::default_public_url")]
    pub public_url: String,

    /// Allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Name of the session cookie carrying the refresh token.
    #[serde(default = "GatewayConfig::default_cookie_name")]
    pub cookie_name: String,

    /// Domain attribute of the session cookie.
    #[serde(default)]
    pub cookie_domain: Option<String>,

    /// Whether cookies carry the `Secure` attribute.
    #[serde(default = "GatewayConfig::default_cookie_secure")]
    pub cookie_secure: bool,

    /// Session cookie lifetime in seconds.
    #[serde(default = "GatewayConfig::default_session_max_age")]
    pub session_cookie_max_age_seconds: u64,

    /// Lifetime of the login state cookie in seconds.
    #[serde(default = "GatewayConfig::default_state_max_age")]
    pub state_cookie_max_age_seconds: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_public_url() -> String {
        "http://localhost:8080".to_string()
    }

    fn default_cookie_name() -> String {
        "tessera_session".to_string()
    }

    const fn default_cookie_secure() -> bool {
        true
    }

    const fn default_session_max_age() -> u64 {
        86_400 // 24 hours
    }

    const fn default_state_max_age() -> u64 {
        600 // 10 minutes
    }

    const fn default_max_body() -> usize {
        64 * 1024 // 64 KB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Name of the cookie holding the login state.
    #[must_use]
    pub fn state_cookie_name(&self) -> String {
        format!("{}_state", self.cookie_name)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            public_url: Self::default_public_url(),
            cors_origins: vec!["*".to_string()],
            cookie_name: Self::default_cookie_name(),
            cookie_domain: None,
            cookie_secure: Self::default_cookie_secure(),
            session_cookie_max_age_seconds: Self::default_session_max_age(),
            state_cookie_max_age_seconds: Self::default_state_max_age(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// The complete service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// HTTP surface settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Directory of the `RocksDB` database.
    #[serde(default = "ServiceConfig::default_data_dir")]
    pub data_dir: String,

    /// Token lifetimes and issuer.
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Signing keys.
    pub keys: KeyConfig,

    /// Identity providers. At least one is required to start.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl ServiceConfig {
    fn default_data_dir() -> String {
        "/data/tessera".to_string()
    }

    /// Parse configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the text is not a valid document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Load configuration from `CONFIG_PATH` and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "tessera.json".into());
        let mut config = Self::from_path(Path::new(&path))?;
        config.apply_overrides(
            std::env::var("LISTEN_ADDR").ok(),
            std::env::var("DATA_DIR").ok(),
        );
        Ok(config)
    }

    /// Replace fields with override values where present.
    pub fn apply_overrides(&mut self, listen_addr: Option<String>, data_dir: Option<String>) {
        if let Some(listen_addr) = listen_addr {
            self.gateway.listen_addr = listen_addr;
        }
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "keys": { "type": "secret", "secret": "s" },
        "providers": [{
            "name": "github",
            "issuer_url": "https://token.actions.githubusercontent.com",
            "client_id": "id",
            "client_secret": "secret"
        }]
    }"#;

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.cookie_name, "tessera_session");
        assert!(config.cookie_secure);
        assert_eq!(config.session_cookie_max_age_seconds, 86_400);
        assert_eq!(config.state_cookie_name(), "tessera_session_state");
    }

    #[test]
    fn timeout_duration() {
        let config = GatewayConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn minimal_service_config() {
        let config = ServiceConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.data_dir, "/data/tessera");
        assert_eq!(config.gateway.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.tokens.access_token_ttl_seconds, 90);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].scopes, ["openid", "email", "profile"]);
    }

    #[test]
    fn overrides_replace_fields() {
        let mut config = ServiceConfig::from_json(MINIMAL).unwrap();
        config.apply_overrides(Some("127.0.0.1:9000".to_string()), None);
        assert_eq!(config.gateway.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.data_dir, "/data/tessera");

        config.apply_overrides(None, Some("/tmp/t".to_string()));
        assert_eq!(config.data_dir, "/tmp/t");
    }

    #[test]
    fn missing_keys_rejected() {
        assert!(matches!(
            ServiceConfig::from_json("{}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unreadable_file() {
        let result = ServiceConfig::from_path(Path::new("/nonexistent/tessera.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
