//! Configuration resolution for the reelstats pipeline
//!
//! Every setting is resolved with CLI → ENV → TOML → compiled default
//! priority. Blank values count as unset at every tier.

use reelstats_common::config::{
    env_value, is_valid_value, ApiConfig, CompiledDefaults, ConfigSource, TomlConfig,
};
use reelstats_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding the catalog API key
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Environment variable overriding the API root
pub const BASE_URL_ENV: &str = "TMDB_BASE_URL";

/// Environment variable overriding the artifact directory
pub const OUTPUT_DIR_ENV: &str = "REELSTATS_OUTPUT_DIR";

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub ids: Option<Vec<i64>>,
    pub cast_limit: Option<usize>,
}

/// Fully resolved pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// `None` is only acceptable when records are loaded from a file
    pub api_key: Option<String>,
    pub base_url: String,
    /// Timeout, retry and rate-limit settings
    pub api: ApiConfig,
    pub movie_ids: Vec<i64>,
    pub cast_limit: usize,
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    /// Resolve every setting from the three tiers
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::default();

        let base_url = first_valid([
            cli.base_url.clone(),
            env_value(BASE_URL_ENV),
            toml_config.api.base_url.clone(),
        ])
        .unwrap_or(defaults.base_url);

        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| env_value(OUTPUT_DIR_ENV).map(PathBuf::from))
            .or_else(|| toml_config.pipeline.output_dir.clone())
            .unwrap_or(defaults.output_dir);

        let movie_ids = cli
            .ids
            .clone()
            .or_else(|| toml_config.pipeline.movie_ids.clone())
            .unwrap_or(defaults.movie_ids);

        let cast_limit = cli.cast_limit.unwrap_or(toml_config.pipeline.cast_limit);

        let config = Self {
            api_key: resolve_api_key(cli.api_key.as_deref(), toml_config),
            base_url,
            api: toml_config.api.clone(),
            movie_ids,
            cast_limit,
            output_dir,
        };

        debug!(
            base_url = %config.base_url,
            output_dir = %config.output_dir.display(),
            ids = config.movie_ids.len(),
            cast_limit = config.cast_limit,
            "Resolved pipeline configuration"
        );
        config
    }

    /// API key, or a configuration error explaining where to set one
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "TMDB API key not configured. Provide one using any of:\n\
                 1. Command line: --api-key <key>\n\
                 2. Environment: {}=<key> (a .env file in the working directory is read)\n\
                 3. TOML config: [api] api_key = \"<key>\"",
                API_KEY_ENV
            ))
        })
    }
}

/// Resolve the API key: CLI → `TMDB_API_KEY` → TOML
///
/// Logs a warning naming the sources when more than one supplies a key.
pub fn resolve_api_key(cli_key: Option<&str>, toml_config: &TomlConfig) -> Option<String> {
    let candidates = [
        ("command line", cli_key.map(str::to_string)),
        ("environment", env_value(API_KEY_ENV)),
        ("TOML", toml_config.api.api_key.clone()),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, key)| key.as_deref().is_some_and(is_valid_value))
        .map(|(source, _)| *source)
        .collect();

    if sources.len() > 1 {
        warn!(
            "TMDB API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    let (source, key) = candidates
        .into_iter()
        .find(|(_, key)| key.as_deref().is_some_and(is_valid_value))?;
    info!("TMDB API key loaded from {}", source);
    key
}

/// Log level: CLI → TOML `[logging] level`
pub fn resolve_log_level(cli_level: Option<&str>, toml_config: &TomlConfig) -> String {
    cli_level
        .filter(|level| is_valid_value(level))
        .map(str::to_string)
        .unwrap_or_else(|| toml_config.logging.level.clone())
}

/// Load `.env` from the working directory when present
///
/// Returns the file that was loaded. Variables already set in the process
/// environment are not overridden.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Parse a comma-separated id list, e.g. `"299534,19995, 597"`
pub fn parse_id_list(text: &str) -> Result<Vec<i64>> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|e| Error::InvalidInput(format!("Invalid movie id '{}': {}", part, e)))
        })
        .collect()
}

/// Load the TOML file located by [`reelstats_common::config::resolve_config_path`]
///
/// Nothing is logged here; report the returned [`ConfigSource`] after
/// tracing is initialized.
pub fn load_toml(cli_path: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    let path = reelstats_common::config::resolve_config_path(cli_path);
    reelstats_common::config::load_config(path.as_deref())
}

fn first_valid<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| is_valid_value(value))
}
