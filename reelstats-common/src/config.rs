//! Configuration loading and config file resolution
//!
//! Settings are layered with the following priority order (highest first):
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing config file is not an error: the compiled defaults are used and
//! the returned [`ConfigSource`] says so, to be logged once tracing is up.
//! A config file that exists but cannot be parsed is reported as
//! [`Error::Config`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "REELSTATS_CONFIG";

/// TMDB v3 API root
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Movie ids analysed when no list is configured.
///
/// Id 0 is not a valid catalog id and is kept on purpose: it exercises the
/// failure path of every run.
pub const DEFAULT_MOVIE_IDS: [i64; 19] = [
    0, 299534, 19995, 140607, 299536, 597, 135397, 420818, 24428, 168259, 99861, 284054, 12445,
    181808, 330457, 351286, 109445, 321612, 260513,
];

/// Number of cast names kept in the flattened `cast` column
pub const DEFAULT_CAST_LIMIT: usize = 10;

/// Configuration file contents
///
/// Every section is optional; absent keys fall back to the compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Remote catalog access
    #[serde(default)]
    pub api: ApiConfig,

    /// What to analyse and where artifacts go
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[api]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root, e.g. `https://api.themoviedb.org/3`
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key (v3 `api_key` query parameter)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures (429, 5xx, transport errors)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Multiplier applied to the delay after each retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Request rate ceiling
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

/// `[pipeline]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Catalog ids to fetch
    #[serde(default)]
    pub movie_ids: Option<Vec<i64>>,

    /// Cast names kept per movie
    #[serde(default = "default_cast_limit")]
    pub cast_limit: usize,

    /// Directory receiving every artifact
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_cast_limit() -> usize {
    DEFAULT_CAST_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_factor: default_backoff_factor(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            movie_ids: None,
            cast_limit: default_cast_limit(),
            output_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Values used when neither CLI, environment nor TOML provide a setting
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub base_url: String,
    pub movie_ids: Vec<i64>,
    pub output_dir: PathBuf,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            movie_ids: DEFAULT_MOVIE_IDS.to_vec(),
            output_dir: PathBuf::from("data"),
        }
    }
}

/// Validate a configured string value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Read an environment variable, treating empty values as unset
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_value(v))
}

/// Locate the config file
///
/// Priority: explicit CLI path → `REELSTATS_CONFIG` → `<config dir>/reelstats/config.toml`.
/// The platform location is only returned when the file exists; explicit
/// paths are returned as given so a typo surfaces as a warning later.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|dir| dir.join("reelstats").join("config.toml"))
        .filter(|path| path.exists())
}

/// Parse a config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// Named file does not exist; compiled defaults in use
    Missing(PathBuf),
    /// No file configured
    Defaults,
}

impl ConfigSource {
    /// Log the outcome of [`load_config`]
    ///
    /// Loading happens before the subscriber exists (the file configures
    /// it), so callers report the source once tracing is initialized.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
            ConfigSource::Defaults => debug!("No config file, using built-in defaults"),
        }
    }
}

/// Load the config file if one is available, otherwise defaults
pub fn load_config(path: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    match path {
        Some(path) if path.exists() => {
            let config = load_toml_config(path)?;
            Ok((config, ConfigSource::File(path.to_path_buf())))
        }
        Some(path) => Ok((TomlConfig::default(), ConfigSource::Missing(path.to_path_buf()))),
        None => Ok((TomlConfig::default(), ConfigSource::Defaults)),
    }
}
