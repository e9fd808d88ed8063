//! Environment configuration.
//!
//! Settings come from environment variables, optionally seeded from a
//! `.env` file. Every variable has a workable development default, so
//! the service starts with no configuration at all.

use serde::Deserialize;

fn default_environment() -> String {
    "development".to_string()
}

fn default_is_https() -> String {
    "f".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_secret_key() -> String {
    "123".to_string()
}

fn default_max_content_length() -> usize {
    120 * 1024 * 1024
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),
}

/// Application configuration read from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment name; anything but `production` counts
    /// as development.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Raw HTTPS toggle; truthy when it starts with `t` or equals `1`,
    /// case-insensitive.
    #[serde(default = "default_is_https")]
    pub is_https: String,
    /// Port the server binds.
    #[serde(default = "default_port")]
    pub port: u16,
    /// External host name; defaults to `localhost:{port}`.
    #[serde(default)]
    pub domain: Option<String>,
    /// External base URL; defaults to `http{s}://{domain}`.
    #[serde(default)]
    pub url_prefix: Option<String>,
    /// Secret the session cookie signing key is derived from.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(envy::from_env()?)
    }

    /// Whether this is a production deployment.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Whether the service is reached over HTTPS.
    pub fn is_https(&self) -> bool {
        let raw = self.is_https.to_lowercase();
        raw.starts_with('t') || raw == "1"
    }

    /// The external host name.
    pub fn domain(&self) -> String {
        self.domain
            .clone()
            .unwrap_or_else(|| format!("localhost:{}", self.port))
    }

    /// The external base URL pages link through.
    pub fn url_prefix(&self) -> String {
        self.url_prefix.clone().unwrap_or_else(|| {
            let scheme = if self.is_https() { "https" } else { "http" };
            format!("{scheme}://{}", self.domain())
        })
    }

    /// The address the server binds.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            is_https: default_is_https(),
            port: default_port(),
            domain: None,
            url_prefix: None,
            secret_key: default_secret_key(),
            max_content_length: default_max_content_length(),
        }
    }
}

/// Load environment variables from a `.env` file, if one exists.
///
/// Existing environment variables take precedence over file values.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
