use crate::core::error::{ConfigError, ResultExt, ToolError, ToolResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Optional tool configuration
/// Searched in order: turbo-tools.toml, .turbo-tools.toml, .config/turbo-tools.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
  #[serde(default)]
  pub registry: RegistryConfig,
}

/// npm registry settings used by version lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
  /// Registry base URL (default: https://registry.npmjs.org)
  #[serde(default = "default_registry_url")]
  pub url: String,

  /// Network timeout for registry requests, in seconds (default: 30)
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_registry_url() -> String {
  "https://registry.npmjs.org".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      url: default_registry_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl RegistryConfig {
  /// Validate registry configuration
  pub fn validate(&self) -> ToolResult<()> {
    if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
      return Err(ToolError::Config(ConfigError::BadValue {
        field: "registry.url".to_string(),
        reason: format!("'{}' must be an http(s) URL", self.url),
      }));
    }

    if self.timeout_secs == 0 {
      return Err(ToolError::Config(ConfigError::BadValue {
        field: "registry.timeout_secs".to_string(),
        reason: "must be greater than zero".to_string(),
      }));
    }

    Ok(())
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  /// Metadata URL for a package, e.g. `https://registry.npmjs.org/turbo`
  pub fn package_url(&self, package: &str) -> String {
    format!("{}/{}", self.url.trim_end_matches('/'), package)
  }
}

impl ToolConfig {
  /// Find config file in search order
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("turbo-tools.toml"),
      path.join(".turbo-tools.toml"),
      path.join(".config").join("turbo-tools.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config if present, defaults otherwise
  pub fn load(path: &Path) -> ToolResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      log::debug!("no turbo-tools.toml under {}, using defaults", path.display());
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ToolConfig = toml_edit::de::from_str(&content)?;

    config.registry.validate()?;

    log::debug!("loaded config from {}", config_path.display());
    Ok(config)
  }
}
