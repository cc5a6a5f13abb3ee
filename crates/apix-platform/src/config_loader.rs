//! Configuration file discovery and loading.
//!
//! The discovery order is:
//! 1. An explicit path (e.g. `--config` on the command line).
//! 2. `APIX_CONFIG` environment variable.
//! 3. `~/.apix/config.json`
//! 4. `~/.apix/config.toml`
//! 5. If none found, the built-in defaults (an empty route table).
//!
//! Documents ending in `.toml` are parsed as TOML, everything else as JSON.
//! Configuration is loaded once at startup and never re-read per request.

use std::path::{Path, PathBuf};

use apix_types::config::Config;
use apix_types::error::ConfigError;

use crate::env::Environment;
use crate::fs::FileSystem;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "APIX_CONFIG";

/// Serialization format of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension (`.toml` or JSON otherwise).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Discover the config file path using the fallback chain.
///
/// Returns `None` if no config file exists at any of the home-directory
/// candidates and `APIX_CONFIG` is unset. A path from `APIX_CONFIG` is
/// returned as-is; the caller reports it if it does not exist.
pub fn discover_config_path(env: &dyn Environment, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(env_path) = env.get_var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(env_path));
    }

    let home = home_dir?;
    let dir = home.join(".apix");
    ["config.json", "config.toml"]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.exists())
}

/// Parse a config document.
pub fn parse_config(contents: &str, format: ConfigFormat, origin: &str) -> Result<Config, ConfigError> {
    let parsed = match format {
        ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| ConfigError::Parse {
        path: origin.to_string(),
        reason,
    })
}

/// Read and parse a config file at `path`.
pub async fn load_config_file(fs: &dyn FileSystem, path: &Path) -> Result<Config, ConfigError> {
    if !fs.exists(path).await {
        return Err(ConfigError::Invalid {
            reason: format!("config file not found: {}", path.display()),
        });
    }

    tracing::debug!(path = %path.display(), "loading config file");
    let contents = fs.read_to_string(path).await?;
    parse_config(
        &contents,
        ConfigFormat::from_path(path),
        &path.display().to_string(),
    )
}

/// Load configuration from an explicit path or via discovery.
///
/// Falls back to [`Config::default`] when nothing is configured anywhere.
pub async fn load_config(
    fs: &dyn FileSystem,
    env: &dyn Environment,
    explicit: Option<&Path>,
) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config_file(fs, path).await;
    }

    match discover_config_path(env, fs.home_dir()) {
        Some(path) => load_config_file(fs, &path).await,
        None => {
            tracing::info!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}
