//! The `mkdocs.yml` configuration file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::nav::NavEntry;

/// Parsed contents of an `mkdocs.yml` file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MkDocsConfig {
    /// Site title (required)
    pub site_name: String,

    /// Site description for page metadata
    #[serde(default)]
    pub site_description: Option<String>,

    /// Directory containing markdown sources, relative to the config file
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Output directory for built sites
    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,

    /// Address the development server listens on
    #[serde(default)]
    pub dev_addr: DevAddr,

    /// Explicit navigation tree; pages are auto-discovered when absent
    #[serde(default)]
    pub nav: Option<Vec<NavEntry>>,

    /// Extra stylesheets, relative to `docs_dir`
    #[serde(default)]
    pub extra_css: Vec<String>,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_site_dir() -> PathBuf {
    PathBuf::from("site")
}

/// A `host:port` development server address.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct DevAddr {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for DevAddr {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl TryFrom<String> for DevAddr {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (host, port) = value
            .rsplit_once(':')
            .ok_or_else(|| format!("dev_addr must be host:port, got '{}'", value))?;

        if host.is_empty() {
            return Err(format!("dev_addr has an empty host: '{}'", value));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| format!("dev_addr has an invalid port: '{}'", value))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl MkDocsConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::debug!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// The URL the development server will be reachable at.
    pub fn dev_url(&self) -> String {
        format!("http://{}", self.dev_addr)
    }
}
