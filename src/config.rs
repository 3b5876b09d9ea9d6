//! Gateway configuration.
//!
//! Loaded from YAML; every field has a default so an empty file (or no file)
//! is a valid configuration:
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 8080
//! base_dir: public
//! server_name: 127.0.0.1
//! upload_dir: /var/tmp/frontgate
//! actions:
//!   default_controller: true
//!   controllers: [users, admin]
//!   routes: ["blog/{slug}"]
//! options:
//!   SERVER_BACKLOG: "512"
//! ```

use crate::request::DEFAULT_SERVER_NAME;
use crate::router::ActionTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Option key for the listen backlog
pub const SERVER_BACKLOG: &str = "SERVER_BACKLOG";

/// Backlog used when `SERVER_BACKLOG` is not configured
pub const DEFAULT_BACKLOG: u32 = 128;

#[derive(Debug)]
pub enum ConfigError {
    MissingOption(String),
    InvalidOption { key: String, value: String },
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_yaml::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingOption(key) => write!(f, "option '{key}' is not set"),
            ConfigError::InvalidOption { key, value } => {
                write!(f, "option '{key}' has invalid value '{value}'")
            }
            ConfigError::Read { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Free-form server options (`SERVER_BACKLOG`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerOptions(pub BTreeMap<String, String>);

impl ServerOptions {
    /// # Errors
    ///
    /// [`ConfigError::MissingOption`] when `key` is absent.
    pub fn get_option(&self, key: &str) -> Result<&str, ConfigError> {
        self.0
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingOption(key.to_string()))
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Listen backlog, [`DEFAULT_BACKLOG`] when unset
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidOption`] when the value is not a positive integer.
    pub fn backlog(&self) -> Result<u32, ConfigError> {
        match self.get_option(SERVER_BACKLOG) {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ConfigError::InvalidOption {
                    key: SERVER_BACKLOG.to_string(),
                    value: raw.to_string(),
                }),
            },
            Err(ConfigError::MissingOption(_)) => Ok(DEFAULT_BACKLOG),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub default_controller: bool,
    pub controllers: Vec<String>,
    pub routes: Vec<String>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            default_controller: true,
            controllers: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl ActionsConfig {
    #[must_use]
    pub fn action_table(&self) -> ActionTable {
        let mut table = ActionTable::new().with_default_controller(self.default_controller);
        for controller in &self.controllers {
            table.add_controller(controller);
        }
        for route in &self.routes {
            table.add_route(route);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Document root for static files
    pub base_dir: PathBuf,
    /// `SERVER_NAME` when the request has no `Host` header
    pub server_name: String,
    /// Upload temp directory; the system temp dir when unset
    pub upload_dir: Option<PathBuf>,
    pub actions: ActionsConfig,
    pub options: ServerOptions,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_dir: PathBuf::from("public"),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            upload_dir: None,
            actions: ActionsConfig::default(),
            options: ServerOptions::default(),
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read a YAML config file.
///
/// # Errors
///
/// [`ConfigError::Read`] or [`ConfigError::Parse`].
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(text: &str) -> Result<GatewayConfig, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(GatewayConfig::default());
    }
    serde_yaml::from_str(text)
}
