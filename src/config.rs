//! Server configuration.
//!
//! Sources, later wins: built-in defaults, an optional YAML file, then
//! command-line overrides.

use std::fs;
use std::path::Path;

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::error::{CaseError, Result};

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    pub host: String,

    /// Port to bind to (default: 3000)
    pub port: u16,

    /// Prefix the case routes are mounted under (default: "/api/v1")
    pub base_path: String,

    /// CORS allowed origins. Empty allows any origin.
    pub cors_origins: Vec<String>,

    /// Answer 404/400 for missing/malformed ids instead of `200 data:null`
    pub strict_not_found: bool,

    /// Start with the demo cases loaded
    pub seed: bool,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_path: "/api/v1".to_string(),
            cors_origins: Vec::new(),
            strict_not_found: false,
            seed: true,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line. `None`/`false` leaves the config untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_path: Option<String>,
    pub strict_not_found: bool,
    pub no_seed: bool,
    pub log_level: Option<String>,
}

impl ServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Read a YAML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ServerConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the file at `path` when given, with `overrides` applied.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(base_path) = overrides.base_path {
            self.base_path = base_path;
        }
        if overrides.strict_not_found {
            self.strict_not_found = true;
        }
        if overrides.no_seed {
            self.seed = false;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(CaseError::Config(format!(
                "base_path must start with '/': {}",
                self.base_path
            )));
        }
        if self.host.trim().is_empty() {
            return Err(CaseError::Config("host must not be empty".to_string()));
        }
        self.cors_header_values()?;
        Ok(())
    }

    /// The configured CORS origins as header values. Fails on the first bad entry.
    pub fn cors_header_values(&self) -> Result<Vec<HeaderValue>> {
        self.cors_origins.iter().map(String::as_str).map(parse_origin).collect()
    }

    /// The case collection path, e.g. `/api/v1/cases`.
    pub fn cases_path(&self) -> String {
        format!("{}/cases", self.base_path.trim_end_matches('/'))
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Parse one `scheme://host[:port]` origin.
pub fn parse_origin(origin: &str) -> Result<HeaderValue> {
    let invalid = || CaseError::Config(format!("invalid cors origin: '{}'", origin));

    let authority = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
        .ok_or_else(invalid)?;
    if authority.is_empty() || authority.contains(['/', '?', '#', ' ', '*']) {
        return Err(invalid());
    }
    HeaderValue::from_str(origin).map_err(|_| invalid())
}
