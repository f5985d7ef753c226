//! Client Configuration
//!
//! Settings for the bundled HTTP transport, loadable from a TOML file:
//!
//! ```toml
//! timeout_seconds = 30
//! connect_timeout_seconds = 5
//! user_agent = "billing-sync/2.1"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Connection establishment timeout in seconds
    #[serde(default)]
    pub connect_timeout_seconds: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("xmlrpc-wire/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Errors that can occur when loading client configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_seconds.map(Duration::from_secs)
    }
}
