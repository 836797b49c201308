//! Cache-or-fetch over a directory tree.
//!
//! Every remote read the walker makes goes through here: a present cache file
//! is returned without touching the network, otherwise the fetch callback runs
//! and its result is persisted only when it reports success. Writes land in a
//! sibling temp file that is atomically persisted over the final path, so a
//! cache file is always either absent or complete.

mod key;
mod status;

pub use key::CacheKey;
pub use status::PayloadStatus;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Return the cached record for `key`, or fetch, validate and cache it.
    ///
    /// `None` means "unavailable this run": the fetch failed, its payload
    /// reported a failure status, or it could not be persisted. Nothing is
    /// written in those cases.
    pub fn get_or_fetch<T, F>(&self, force_refresh: bool, key: &CacheKey, fetch: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned + PayloadStatus,
        F: FnOnce() -> Result<T>,
    {
        let path = self.path_for(key);
        if !force_refresh {
            match read_json::<T>(&path) {
                Ok(Some(cached)) => {
                    tracing::debug!(key = %key, "cache hit");
                    return Some(cached);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(key = %key, "unreadable cache entry, refetching: {:#}", e),
            }
        }

        let result = fetch().and_then(|data| {
            if let Some(reason) = data.failure() {
                anyhow::bail!("remote reported failure: {}", reason);
            }
            let bytes = serde_json::to_vec_pretty(&data).context("serialize payload")?;
            persist(&path, &bytes)?;
            Ok(data)
        });
        match result {
            Ok(data) => {
                tracing::debug!(key = %key, "cached");
                Some(data)
            }
            Err(e) => {
                tracing::error!(key = %key, "fetch failed: {:#}", e);
                None
            }
        }
    }

    /// Raw-bytes variant for covers and caption streams. `accept` rejects
    /// payloads that transferred fine but are not what was asked for.
    pub fn get_or_fetch_bytes<A, F>(
        &self,
        force_refresh: bool,
        key: &CacheKey,
        accept: A,
        fetch: F,
    ) -> Option<Vec<u8>>
    where
        A: Fn(&[u8]) -> bool,
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let path = self.path_for(key);
        if !force_refresh {
            match std::fs::read(&path) {
                Ok(bytes) if accept(&bytes) => {
                    tracing::debug!(key = %key, "cache hit");
                    return Some(bytes);
                }
                Ok(_) => tracing::warn!(key = %key, "cached payload rejected, refetching"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(key = %key, "unreadable cache entry, refetching: {}", e),
            }
        }

        let result = fetch().and_then(|bytes| {
            if !accept(&bytes) {
                anyhow::bail!("payload rejected ({} bytes)", bytes.len());
            }
            persist(&path, &bytes)?;
            Ok(bytes)
        });
        match result {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!(key = %key, "fetch failed: {:#}", e);
                None
            }
        }
    }

    /// Unconditionally write a record (used for derived files such as `info.json`).
    pub fn put<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<PathBuf> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec_pretty(value).context("serialize record")?;
        persist(&path, &bytes)?;
        Ok(path)
    }
}

/// `Ok(None)` when the file does not exist; `Err` when it exists but cannot be decoded.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("decode {}", path.display()))?;
    Ok(Some(value))
}

/// Write `bytes` to a temp file beside `path` and atomically move it into place.
fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("cache path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create dir: {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(bytes).context("write cache temp file")?;
    tmp.as_file().sync_all().context("sync cache temp file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("persist {}", path.display()))?;
    Ok(())
}
