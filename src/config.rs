use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::api::Invalidation;
use crate::cache::DEFAULT_TTL_HOURS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// The single POST endpoint of the portfolio backend
  pub url: String,
  /// Per-request timeout; generous because the backend cold-starts slowly
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  60
}

impl ApiConfig {
  pub fn endpoint(&self) -> Result<Url> {
    let url = Url::parse(&self.url).map_err(|e| eyre!("Invalid api.url '{}': {}", self.url, e))?;
    match url.scheme() {
      "http" | "https" => Ok(url),
      other => Err(eyre!("Unsupported scheme '{}' in api.url", other)),
    }
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long a cached response stays fresh
  #[serde(default = "default_ttl_hours")]
  pub ttl_hours: i64,
  /// What a successful write discards: `all` or `scoped`
  #[serde(default)]
  pub invalidation: Invalidation,
  /// Storage file (default: $XDG_DATA_HOME/damon/storage.db)
  pub path: Option<PathBuf>,
}

fn default_ttl_hours() -> i64 {
  DEFAULT_TTL_HOURS
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_hours: DEFAULT_TTL_HOURS,
      invalidation: Invalidation::default(),
      path: None,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Result<chrono::Duration> {
    chrono::Duration::try_hours(self.ttl_hours)
      .ok_or_else(|| eyre!("cache.ttl_hours {} is out of range", self.ttl_hours))
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter directive used when RUST_LOG is unset
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write daily log files here instead of stderr
  pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
  "warn".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./damon.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/damon/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/damon/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("damon.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("damon").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.api.endpoint()?;
    if config.cache.ttl_hours < 0 {
      return Err(eyre!("cache.ttl_hours must not be negative"));
    }
    config.cache.ttl()?;
    Ok(config)
  }

  /// Get the admin username from the environment.
  pub fn get_username() -> Result<String> {
    std::env::var("DAMON_USERNAME")
      .map_err(|_| eyre!("Username not found. Pass --username or set DAMON_USERNAME."))
  }

  /// Get the admin password from the environment.
  pub fn get_password() -> Result<String> {
    std::env::var("DAMON_PASSWORD")
      .map_err(|_| eyre!("Password not found. Set DAMON_PASSWORD environment variable."))
  }
}
