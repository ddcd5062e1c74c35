//! Configuration loading.
//!
//! `pipewatch.toml` is optional: every section uses `#[serde(default)]` so a
//! missing or empty file yields the defaults. The log root can also be set
//! through `PIPEWATCH_LOG_ROOT`, read after `.env` is loaded.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

/// File name searched for in the working directory and the config directory.
pub const CONFIG_FILE_NAME: &str = "pipewatch.toml";

/// Environment variable overriding `monitor.log_root`.
pub const LOG_ROOT_ENV: &str = "PIPEWATCH_LOG_ROOT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where pipeline logs live and how they are summarized.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Detail view settings.
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

/// Log root and aggregation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Directory whose subdirectories are pipelines.
    #[serde(default = "default_log_root")]
    pub log_root: PathBuf,

    /// Summarize pipelines on the blocking pool instead of one by one.
    #[serde(default = "default_true")]
    pub concurrent: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_root: default_log_root(),
            concurrent: true,
        }
    }
}

/// Detail view settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    /// Number of trailing lines shown in the log preview.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            tail_lines: default_tail_lines(),
        }
    }
}

fn default_log_root() -> PathBuf {
    PathBuf::from("log")
}
fn default_true() -> bool {
    true
}
fn default_tail_lines() -> usize {
    10
}

impl Config {
    /// Replace `monitor.log_root` with `value` when it is non-empty.
    pub fn apply_log_root_override(&mut self, value: Option<&str>) {
        if let Some(root) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.monitor.log_root = PathBuf::from(root);
        }
    }
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    Ok(config)
}

/// Resolve the per-user config directory (`~/.pipewatch/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".pipewatch"))
}

/// Load configuration the way the CLI does.
///
/// Uses `explicit` if given, else `./pipewatch.toml`, else
/// `~/.pipewatch/pipewatch.toml`, else defaults. Then loads `.env` (if any)
/// and applies `PIPEWATCH_LOG_ROOT`.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load_default_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)?
        }
        None => Config::default(),
    };

    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "no .env loaded");
    }
    let env_root = std::env::var(LOG_ROOT_ENV).ok();
    config.apply_log_root_override(env_root.as_deref());

    Ok(config)
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    config_dir()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}
