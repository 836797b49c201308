//! Per-run context: configuration plus the authenticated transport.
//!
//! Built once by the top-level command and handed to every component
//! constructor, so nothing reaches for process-wide session state.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::ContentCache;
use crate::config::HoardConfig;
use crate::downloader::{DownloadOptions, ResumableDownloader};
use crate::transport::{cookie_header, load_cookie_jar, CurlTransport, Transport, TransportOptions};

#[derive(Clone)]
pub struct RunContext {
    config: HoardConfig,
    transport: Arc<dyn Transport>,
    cache_root: PathBuf,
}

impl RunContext {
    /// Context over an existing transport (tests, alternative backends).
    pub fn new(config: HoardConfig, transport: Arc<dyn Transport>) -> Self {
        let cache_root = config.cache_root();
        Self {
            config,
            transport,
            cache_root,
        }
    }

    /// Production context: curl transport carrying the configured cookie jar.
    pub fn from_config(config: HoardConfig) -> Result<Self> {
        let options = transport_options(&config)?;
        tracing::debug!(
            user_agent = %options.user_agent,
            authenticated = options.cookie.is_some(),
            "transport ready"
        );
        Ok(Self::new(config, Arc::new(CurlTransport::new(options))))
    }

    pub fn config(&self) -> &HoardConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn cache(&self) -> ContentCache {
        ContentCache::new(&self.cache_root)
    }

    pub fn downloader(&self) -> ResumableDownloader {
        ResumableDownloader::new(
            self.transport(),
            self.config.retry_policy(),
            DownloadOptions::from(&self.config.download_config()),
        )
    }
}

fn transport_options(config: &HoardConfig) -> Result<TransportOptions> {
    let mut options = TransportOptions {
        default_timeout: config.request_timeout(),
        ..Default::default()
    };
    if let Some(ua) = &config.user_agent {
        options.user_agent = ua.clone();
    }
    if let Some(path) = &config.cookie_file {
        let jar = load_cookie_jar(path)?;
        if jar.is_empty() {
            tracing::warn!(path = %path.display(), "cookie jar is empty, requests are anonymous");
        } else {
            options.cookie = Some(cookie_header(&jar));
        }
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn options_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("cookies.json");
        std::fs::write(&jar, r#"{"session":"s1"}"#).unwrap();
        let config = HoardConfig {
            cookie_file: Some(jar),
            user_agent: Some("test-agent".into()),
            request_timeout_secs: 7,
            ..Default::default()
        };
        let opts = transport_options(&config).unwrap();
        assert_eq!(opts.cookie.as_deref(), Some("session=s1"));
        assert_eq!(opts.user_agent, "test-agent");
        assert_eq!(opts.default_timeout, Duration::from_secs(7));
    }

    #[test]
    fn missing_cookie_jar_is_an_error() {
        let config = HoardConfig {
            cookie_file: Some(PathBuf::from("/nonexistent/hoard/cookies.json")),
            ..Default::default()
        };
        assert!(RunContext::from_config(config).is_err());
    }

    #[test]
    fn cache_root_follows_config() {
        let config = HoardConfig {
            cache_dir: Some(PathBuf::from("/srv/media")),
            ..Default::default()
        };
        let ctx = RunContext::from_config(config).unwrap();
        assert_eq!(ctx.cache_root(), Path::new("/srv/media"));
        assert_eq!(ctx.cache().root(), Path::new("/srv/media"));
    }
}
