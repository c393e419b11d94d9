//! Configuration resolution for shelfmark-api
//!
//! Two-tier resolution with ENV > TOML > built-in defaults. Every resolved
//! value logs its source so a misconfigured deployment is diagnosable from the
//! startup log alone.

use serde::Deserialize;
use shelfmark_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP bind address
const DEFAULT_BIND: &str = "127.0.0.1:5780";
/// Default SQLite database file, relative to the working directory
const DEFAULT_DATABASE: &str = "shelfmark.db";
/// Default external catalog base URL (Open Library volumes API)
const DEFAULT_CATALOG_BASE_URL: &str = "https://openlibrary.org";

/// Optional TOML configuration file contents
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP bind address, e.g. "127.0.0.1:5780"
    pub bind: Option<String>,
    /// Path to the SQLite database file
    pub database: Option<PathBuf>,
    /// Base URL of the external book catalog
    pub catalog_base_url: Option<String>,
    /// Path to a newline-separated denylist terms file for the review classifier
    pub denylist_file: Option<PathBuf>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub database: PathBuf,
    pub catalog_base_url: String,
    pub denylist_file: Option<PathBuf>,
}

impl ServiceConfig {
    /// Resolve configuration from ENV > TOML > defaults
    ///
    /// `toml_path` is read if it exists; a missing file is not an error, a
    /// malformed one is.
    pub fn resolve(toml_path: &Path) -> Result<Self> {
        let toml_config = load_toml(toml_path)?;

        let bind = resolve_value(
            "bind",
            std::env::var("SHELFMARK_BIND").ok(),
            toml_config.bind.clone(),
            DEFAULT_BIND.to_string(),
        );

        let database = resolve_value(
            "database",
            std::env::var("SHELFMARK_DATABASE").ok().map(PathBuf::from),
            toml_config.database.clone(),
            PathBuf::from(DEFAULT_DATABASE),
        );

        let catalog_base_url = resolve_value(
            "catalog_base_url",
            std::env::var("SHELFMARK_CATALOG_BASE_URL").ok(),
            toml_config.catalog_base_url.clone(),
            DEFAULT_CATALOG_BASE_URL.to_string(),
        );

        let denylist_file = std::env::var("SHELFMARK_DENYLIST_FILE")
            .ok()
            .map(PathBuf::from)
            .or(toml_config.denylist_file);
        if let Some(path) = &denylist_file {
            info!("Denylist terms file: {}", path.display());
        }

        Ok(ServiceConfig {
            bind,
            database,
            catalog_base_url,
            denylist_file,
        })
    }
}

/// Read the optional TOML config file
fn load_toml(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    info!("Loaded TOML config: {}", path.display());
    Ok(config)
}

/// Pick ENV over TOML over default, logging which source won
fn resolve_value<T: std::fmt::Debug>(
    name: &str,
    env_value: Option<T>,
    toml_value: Option<T>,
    default: T,
) -> T {
    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} set in both environment and TOML; using environment (highest priority)",
            name
        );
    }

    if let Some(value) = env_value {
        info!("{} = {:?} (from environment)", name, value);
        return value;
    }
    if let Some(value) = toml_value {
        info!("{} = {:?} (from TOML)", name, value);
        return value;
    }
    info!("{} = {:?} (default)", name, default);
    default
}
