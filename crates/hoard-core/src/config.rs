use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Fixed delay between attempts in seconds (e.g. 0.5 = 500ms).
    pub delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 2.0,
        }
    }
}

/// Large payload transfer tuning (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Transfer buffer size in bytes; the body is written in chunks of at most this size.
    pub chunk_size: usize,
    /// Smallest plausible payload. Anything declaring less is an error page in disguise.
    pub min_payload_bytes: u64,
    /// Allowed relative difference between bytes on disk and the declared total.
    pub size_tolerance: f64,
    /// Hard timeout for one transfer attempt, in seconds.
    pub transfer_timeout_secs: u64,
    /// Delete the partial file whenever an attempt fails (restart from zero next time).
    #[serde(default)]
    pub discard_partial_on_error: bool,
    /// Minimum seconds between progress log lines for one transfer.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
}

fn default_progress_interval() -> u64 {
    5
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512 * 1024,
            min_payload_bytes: 1024 * 1024,
            size_tolerance: 0.01,
            transfer_timeout_secs: 3600,
            discard_partial_on_error: false,
            progress_interval_secs: default_progress_interval(),
        }
    }
}

/// URL templates for the JSON catalog. Placeholders: `{owner}`, `{folder}`,
/// `{page}`, `{item}`, `{caption}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub folders_url: String,
    pub page_url: String,
    pub stream_url: String,
    pub comments_url: String,
    pub captions_url: String,
    /// Per-item access check (`{item}`); a non-2xx or non-zero `code` skips the item.
    #[serde(default)]
    pub access_url: Option<String>,
    /// Sent as `Referer` on stream requests, if set.
    #[serde(default)]
    pub referer: Option<String>,
}

/// Global configuration loaded from `~/.config/hoard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoardConfig {
    /// Number of background download workers.
    pub workers: usize,
    /// Number of parallel item workers per catalog page.
    pub page_workers: usize,
    /// Pause between catalog page requests, in milliseconds.
    pub page_delay_ms: u64,
    /// Timeout for small requests (listings, comments, captions, covers), in seconds.
    pub request_timeout_secs: u64,
    /// Root of the on-disk cache. Defaults to `./data`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// JSON file with a `{"name": "value"}` cookie map for the pre-authenticated session.
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
    /// Override the HTTP User-Agent.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional transfer tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub download: Option<DownloadConfig>,
    /// Catalog endpoints. Required by `hoard collect`.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl Default for HoardConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            page_workers: 4,
            page_delay_ms: 1000,
            request_timeout_secs: 30,
            cache_dir: None,
            cookie_file: None,
            user_agent: None,
            retry: None,
            download: None,
            remote: None,
        }
    }
}

impl HoardConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn download_config(&self) -> DownloadConfig {
        self.download.clone().unwrap_or_default()
    }

    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hoard")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// State directory: `~/.local/state/hoard`.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hoard")?;
    Ok(xdg_dirs.get_state_home().join("hoard"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HoardConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HoardConfig::default();
        let toml = render(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Effective configuration as TOML, as `load_or_init` would write it.
pub fn render(cfg: &HoardConfig) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<HoardConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: HoardConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
