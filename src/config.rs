//! Typed configuration
//!
//! One TOML file under the platform config dir, loaded and validated once
//! at startup. The store API token is resolved through an explicit ordered
//! source chain rather than ad hoc fallbacks, and is never written back to
//! disk by this tool.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "RA_CLI_CONFIG";
pub const TOKEN_ENV: &str = "RA_API_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the spreadsheet API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed identifier of the shared spreadsheet.
    pub spreadsheet_id: String,
    /// Title of the rolling summary sheet.
    #[serde(default = "default_summary_sheet")]
    pub summary_sheet: String,
    /// Last-resort token source; prefer the environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Course → subject area table (columns Assignatura, Matèria).
    pub courses_file: PathBuf,
    /// Subject area → outcome table (Matèria, Codi RA, description,
    /// classification).
    pub outcomes_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
}

fn default_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_summary_sheet() -> String {
    "Resum".to_string()
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("ra-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".ra-cli")
        };
        Ok(config_dir.join("config.toml"))
    }

    /// Load and validate the configuration. A bad or missing file is fatal
    /// to the session.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let config_path = match path_override {
            Some(p) => p.to_path_buf(),
            None => Self::get_config_path()?,
        };
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            bail!(
                "Config file not found: {}\nCreate it with [store] spreadsheet_id and [catalog] courses_file/outcomes_file",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        config.validate()?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.spreadsheet_id.trim().is_empty() {
            bail!("store.spreadsheet_id must not be empty");
        }
        if self.store.summary_sheet.trim().is_empty() {
            bail!("store.summary_sheet must not be empty");
        }
        if self.catalog.courses_file.as_os_str().is_empty()
            || self.catalog.outcomes_file.as_os_str().is_empty()
        {
            bail!("catalog.courses_file and catalog.outcomes_file must both be set");
        }
        Ok(())
    }
}

/// Resolve the store API token through the ordered source chain:
/// `--token` flag, `RA_API_TOKEN` in the environment, `.env` file, then
/// `store.api_token` in the config file. Fails fast naming every source
/// tried.
pub fn resolve_api_token(
    flag_token: Option<String>,
    config_token: Option<String>,
) -> Result<String> {
    let mut tried = Vec::new();

    if let Some(token) = flag_token {
        if !token.trim().is_empty() {
            debug!("API token from --token flag");
            return Ok(token);
        }
    }
    tried.push("--token flag");

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            debug!("API token from {} environment variable", TOKEN_ENV);
            return Ok(token);
        }
    }
    tried.push("RA_API_TOKEN environment variable");

    if dotenvy::dotenv().is_ok() {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                debug!("API token from .env file");
                return Ok(token);
            }
        }
    }
    tried.push(".env file");

    if let Some(token) = config_token {
        if !token.trim().is_empty() {
            debug!("API token from config file");
            return Ok(token);
        }
    }
    tried.push("store.api_token in the config file");

    bail!(
        "No API token found. Sources tried, in order: {}",
        tried.join(", ")
    )
}
