//! Configuration loading and config file resolution
//!
//! Config file location is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `GEOHASH_CONFIG` environment variable
//! 3. `<user config dir>/geohash/config.toml`
//! 4. Compiled defaults (no file)
//!
//! A missing config file never terminates the process: a warning is logged
//! and compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "GEOHASH_CONFIG";

/// Source names enabled when the config does not list any
pub const DEFAULT_SOURCES: [&str; 3] = ["investing", "financial_times", "business_insider"];

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0 GeohashBot/0.1";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub watchers: WatchersConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How long and how often to wait for the market value to appear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between resolution attempts
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Give up waiting after this many seconds (treated as "market closed")
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Scraped page sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Source identifiers to query
    #[serde(default = "default_sources")]
    pub enabled: Vec<String>,

    /// User-Agent header sent with every page request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_sources(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Watcher table location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchersConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Where rendered expedition sections go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Page file to append to (stdout when unset)
    #[serde(default)]
    pub page: Option<PathBuf>,

    /// Prefix for per-expedition edit links; the page title is appended
    #[serde(default = "default_edit_url_base")]
    pub edit_url_base: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            page: None,
            edit_url_base: default_edit_url_base(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    3 * 60 * 60
}

fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_edit_url_base() -> String {
    "https://geohashing.site/index.php?title=".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the bot spin or never ask anything
    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            return Err(Error::Config("polling.interval_secs must be > 0".to_string()));
        }
        if self.sources.request_timeout_secs == 0 {
            return Err(Error::Config(
                "sources.request_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.sources.enabled.is_empty() {
            return Err(Error::Config("sources.enabled must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Resolves which config file (if any) to load
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Config file path by priority, or `None` when only defaults apply
    pub fn resolve(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: user config directory, only if it exists
        default_config_path().filter(|p| p.exists())
    }

    /// Resolve and load, degrading to defaults when the file is missing
    pub fn load(&self) -> Result<TomlConfig> {
        match self.resolve() {
            Some(path) => load_toml_config(&path),
            None => {
                info!("No config file found, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// `<user config dir>/geohash/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("geohash").join("config.toml"))
}

/// Load a config file; a missing file yields defaults with a warning
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = TomlConfig::from_toml_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp = target.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    std::fs::write(&temp, content)?;
    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(Error::Io(e));
    }
    Ok(())
}

/// Write `config` as a new config file at `target`
///
/// An existing file is only replaced when `force` is set.
pub fn init_config_file(config: &TomlConfig, target: &Path, force: bool) -> Result<()> {
    if target.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        )));
    }

    config.validate()?;
    write_toml_config(config, target)?;
    info!("Wrote config to {}", target.display());
    Ok(())
}
