//! Configuration for the reviewlens client
//!
//! Settings are layered: built-in defaults, then a YAML config file, then
//! environment variables. Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::paginate::PAGE_SIZE;

pub const SERVER_URL_ENV: &str = "REVIEWLENS_SERVER_URL";
pub const TIMEOUT_ENV: &str = "REVIEWLENS_TIMEOUT_SECS";

const LOCAL_CONFIG_FILES: [&str; 2] = ["reviewlens.yaml", ".reviewlens.yaml"];

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read config file {path}: {message}")]
  Read { path: String, message: String },

  #[error("Invalid config file {path}: {message}")]
  Parse { path: String, message: String },

  #[error("Invalid setting '{key}': {message}")]
  Invalid { key: String, message: String },
}

impl ConfigError {
  pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Invalid { key: key.into(), message: message.into() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
  /// Base URL of the analysis backend
  #[serde(default = "default_server_url")]
  pub server_url: String,
  /// Upper bound on one analysis request, in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Rows per table page
  #[serde(default = "default_page_size")]
  pub page_size: usize,
  /// Largest file accepted for upload, in bytes
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: u64,
  /// File extensions accepted for upload
  #[serde(default = "default_allowed_extensions")]
  pub allowed_extensions: Vec<String>,
}

fn default_server_url() -> String {
  "http://localhost:3000".to_string()
}
fn default_timeout_secs() -> u64 {
  300
}
fn default_page_size() -> usize {
  PAGE_SIZE
}
fn default_max_upload_bytes() -> u64 {
  10 * 1024 * 1024
}
fn default_allowed_extensions() -> Vec<String> {
  vec!["csv".to_string(), "txt".to_string()]
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      server_url: default_server_url(),
      timeout_secs: default_timeout_secs(),
      page_size: default_page_size(),
      max_upload_bytes: default_max_upload_bytes(),
      allowed_extensions: default_allowed_extensions(),
    }
  }
}

impl Settings {
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.display().to_string(),
      message: e.to_string(),
    })
  }

  /// Load from `explicit` if given, else the first config file found, else defaults;
  /// then apply environment overrides and validate.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let mut settings = match explicit {
      Some(path) => Self::load_from_file(path)?,
      None => match find_config_file() {
        Some(path) => {
          debug!("Using config file {}", path.display());
          Self::load_from_file(path)?
        }
        None => Self::default(),
      },
    };

    settings.apply_env()?;
    settings.validate()?;
    Ok(settings)
  }

  pub fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Ok(url) = std::env::var(SERVER_URL_ENV) {
      self.server_url = url;
    }

    if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
      self.timeout_secs = raw.trim().parse().map_err(|_| {
        ConfigError::invalid(TIMEOUT_ENV, format!("'{raw}' is not a number of seconds"))
      })?;
    }

    Ok(())
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    Url::parse(&self.server_url)
      .map_err(|e| ConfigError::invalid("server_url", format!("{}: {e}", self.server_url)))?;

    if self.timeout_secs == 0 {
      return Err(ConfigError::invalid("timeout_secs", "must be greater than zero"));
    }

    if self.page_size == 0 {
      return Err(ConfigError::invalid("page_size", "must be greater than zero"));
    }

    Ok(())
  }

  pub fn is_allowed_extension(&self, path: &Path) -> bool {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| self.allowed_extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
      .unwrap_or(false)
  }
}

/// Local config files first, then the per-user config directory
fn find_config_file() -> Option<PathBuf> {
  LOCAL_CONFIG_FILES
    .iter()
    .map(PathBuf::from)
    .chain(dirs::config_dir().map(|dir| dir.join("reviewlens").join("config.yaml")))
    .find(|path| path.is_file())
}
