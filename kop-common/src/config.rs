//! Configuration loading and value resolution
//!
//! Bootstrap configuration comes from a small TOML file. Every value is
//! resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and the compiled
//! defaults apply. A TOML file that exists but cannot be parsed IS an error.

use crate::time::secs_to_duration;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an alternate config file
pub const ENV_CONFIG_PATH: &str = "KOP_CONFIG";
/// Environment variable overriding `api.base_url`
pub const ENV_API_BASE_URL: &str = "KOP_API_BASE_URL";
/// Environment variable overriding `api.token`
pub const ENV_API_TOKEN: &str = "KOP_API_TOKEN";
/// Environment variable overriding `performa.cadence`
pub const ENV_CADENCE: &str = "KOP_CADENCE";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Survey cadence: how often a cooperative files a performa snapshot
///
/// One cadence is chosen per deployment; every record of an organization uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    /// One snapshot per month, keyed `YYYY-MM`
    #[default]
    Monthly,
    /// One snapshot per year, keyed `YYYY`
    Yearly,
}

impl FromStr for Cadence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "bulanan" => Ok(Cadence::Monthly),
            "yearly" | "tahunan" => Ok(Cadence::Yearly),
            other => Err(Error::Config(format!(
                "Unknown cadence '{}' (expected 'monthly' or 'yearly')",
                other
            ))),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Monthly => f.write_str("monthly"),
            Cadence::Yearly => f.write_str("yearly"),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Backend API connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Performa survey behaviour
    #[serde(default)]
    pub performa: PerformaConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request (optional)
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Performa survey settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PerformaConfig {
    #[serde(default)]
    pub cadence: Cadence,

    /// How long cached period lists and records stay fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for PerformaConfig {
    fn default() -> Self {
        Self {
            cadence: Cadence::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform config file location: `<config_dir>/kopdesk/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kopdesk").join("config.toml"))
}

/// Read and parse a TOML config file
///
/// Fails if the file is missing or malformed.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load the TOML config, degrading to defaults when the file does not exist
pub fn load_toml_config_or_default(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(path)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Values supplied on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub cadence: Option<Cadence>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub cadence: Cadence,
    pub cache_ttl: Duration,
    pub log_level: String,
}

/// Resolves each configuration value across CLI, environment, TOML and defaults
pub struct ConfigResolver {
    overrides: ConfigOverrides,
}

impl ConfigResolver {
    pub fn new(overrides: ConfigOverrides) -> Self {
        Self { overrides }
    }

    /// Config file to read: CLI > `KOP_CONFIG` > platform default
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.overrides.config_path {
            return Some(path.clone());
        }
        if let Some(path) = non_empty_env(ENV_CONFIG_PATH) {
            return Some(PathBuf::from(path));
        }
        default_config_path()
    }

    /// Resolve configuration, loading the TOML file if one is found
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let toml_config = match self.config_path() {
            Some(path) => load_toml_config_or_default(&path)?,
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                TomlConfig::default()
            }
        };
        self.resolve_with(toml_config)
    }

    /// Resolve configuration against an already-loaded TOML config
    pub fn resolve_with(&self, toml_config: TomlConfig) -> Result<ResolvedConfig> {
        let base_url = self
            .overrides
            .base_url
            .clone()
            .or_else(|| non_empty_env(ENV_API_BASE_URL))
            .unwrap_or(toml_config.api.base_url);
        let base_url = normalize_base_url(&base_url)?;

        let token = self
            .overrides
            .token
            .clone()
            .or_else(|| non_empty_env(ENV_API_TOKEN))
            .or(toml_config.api.token)
            .filter(|t| !t.trim().is_empty());

        let cadence = match (self.overrides.cadence, non_empty_env(ENV_CADENCE)) {
            (Some(cadence), _) => cadence,
            (None, Some(raw)) => raw.parse()?,
            (None, None) => toml_config.performa.cadence,
        };

        if toml_config.api.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            base_url,
            token,
            timeout: secs_to_duration(toml_config.api.timeout_secs),
            cadence,
            cache_ttl: secs_to_duration(toml_config.performa.cache_ttl_secs),
            log_level: toml_config.logging.level,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Validate scheme and strip trailing slashes
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API base URL must start with http:// or https://, got '{}'",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_cadence_from_str() {
        assert_eq!("monthly".parse::<Cadence>().unwrap(), Cadence::Monthly);
        assert_eq!(" Yearly ".parse::<Cadence>().unwrap(), Cadence::Yearly);
        assert_eq!("tahunan".parse::<Cadence>().unwrap(), Cadence::Yearly);
        assert!("weekly".parse::<Cadence>().is_err());
    }

    #[test]
    fn test_cadence_display_matches_serde() {
        let json = serde_json::to_string(&Cadence::Yearly).unwrap();
        assert_eq!(json, format!("\"{}\"", Cadence::Yearly));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/api/").unwrap(),
            "http://localhost:8000/api"
        );
        assert!(normalize_base_url("localhost:8000").is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("[performa]\ncadence = \"yearly\"\n").unwrap();

        assert_eq!(config.performa.cadence, Cadence::Yearly);
        assert_eq!(config.performa.cache_ttl_secs, 60);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }
}
