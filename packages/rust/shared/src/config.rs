//! Application configuration for ContentForge.
//!
//! User config lives at `~/.contentforge/contentforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentforge";

// ---------------------------------------------------------------------------
// Config structs (matching contentforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Source fetch policies.
    #[serde(default)]
    pub fetch_policies: FetchPoliciesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Root directory for persisted context and content artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "~/contentforge-out".into()
}

/// `[fetch_policies]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPoliciesConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry budget for transient network failures.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base backoff between retries, in ms (doubled per attempt).
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Minimum ms between requests to the same host (robots crawl-delay
    /// can only raise this, never lower it).
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Concurrent source fetches per context build.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for FetchPoliciesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_backoff_ms: default_backoff_ms(),
            rate_limit_ms: default_rate_limit(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    20
}
fn default_retries() -> u32 {
    2
}
fn default_backoff_ms() -> u64 {
    250
}
fn default_rate_limit() -> u64 {
    200
}
fn default_concurrency() -> u32 {
    4
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry budget for transient network failures.
    pub retries: u32,
    /// Base backoff between retries, in ms.
    pub retry_backoff_ms: u64,
    /// Minimum ms between requests to the same host.
    pub rate_limit_ms: u64,
    /// Concurrent source fetches per context build.
    pub concurrency: u32,
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.fetch_policies.timeout_secs,
            retries: config.fetch_policies.retries,
            retry_backoff_ms: config.fetch_policies.retry_backoff_ms,
            rate_limit_ms: config.fetch_policies.rate_limit_ms,
            concurrency: config.fetch_policies.concurrency,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentforge/contentforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentForgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContentForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
