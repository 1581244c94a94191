//! Console configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! ```toml
//! [api]
//! base_url = "https://erp.example.com/api"
//! timeout_secs = 30
//!
//! [auth]
//! token_file = "~/.config/solar-console/token"
//!
//! [cascade]
//! levels = ["state", "cluster", "district"]
//! reselect = "refresh"
//!
//! [logging]
//! filter = "info"
//! json = false
//! ```

use crate::error::{ConsoleError, Result};
use crate::types::{LocationLevel, ReselectPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const ENV_API_URL: &str = "CONSOLE_API_URL";
/// Environment variable providing a bearer token
pub const ENV_TOKEN: &str = "CONSOLE_TOKEN";
/// Environment variable overriding `logging.filter`
pub const ENV_LOG: &str = "CONSOLE_LOG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backend connection
    pub api: ApiConfig,
    /// Token handling
    pub auth: AuthConfig,
    /// Location cascade shape
    pub cascade: CascadeConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every resource path is appended to
    pub base_url: String,
    /// Request timeout; `None` keeps the HTTP client default
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: None,
        }
    }
}

/// Token settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// File the token is persisted to
    pub token_file: Option<PathBuf>,
    /// Token supplied directly (environment override)
    #[serde(skip)]
    pub token: Option<String>,
}

/// Cascade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Chain levels, broadest first
    pub levels: Vec<LocationLevel>,
    /// Same-value reselection behaviour
    pub reselect: ReselectPolicy,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                LocationLevel::State,
                LocationLevel::Cluster,
                LocationLevel::District,
            ],
            reselect: ReselectPolicy::Refresh,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive
    pub filter: String,
    /// Emit JSON lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl ConsoleConfig {
    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConsoleError::Config(format!("invalid config: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.auth.token = Some(token);
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.logging.filter = filter;
        }
        self.check()?;
        Ok(self)
    }

    /// Apply overrides from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn check(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConsoleError::Config(format!(
                "api.base_url must be an http(s) URL, got '{url}'"
            )));
        }
        if self.cascade.levels.is_empty() {
            return Err(ConsoleError::Config(
                "cascade.levels must name at least one level".to_string(),
            ));
        }
        for (i, level) in self.cascade.levels.iter().enumerate() {
            if self.cascade.levels[..i].contains(level) {
                return Err(ConsoleError::Config(format!(
                    "cascade.levels repeats '{level}'"
                )));
            }
        }
        if self.api.timeout_secs == Some(0) {
            return Err(ConsoleError::Config(
                "api.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
