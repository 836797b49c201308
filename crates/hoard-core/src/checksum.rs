//! SHA-256 of cached payloads, computed on demand.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::storage::TEMP_SUFFIX;

const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub path: PathBuf,
    pub size: u64,
    /// Lowercase hex.
    pub sha256: String,
}

/// Hash one file in fixed-size chunks.
pub fn file_digest(path: &Path) -> Result<FileDigest> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    let mut size = 0u64;
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        size += n as u64;
        hasher.update(&buf[..n]);
    }
    Ok(FileDigest {
        path: path.to_path_buf(),
        size,
        sha256: hex::encode(hasher.finalize()),
    })
}

/// Hash a file, or every finished file below a directory (partial `.tmp`
/// transfers are skipped). Results are sorted by path.
pub fn digest_path(path: &Path) -> Result<Vec<FileDigest>> {
    if !path.is_dir() {
        return Ok(vec![file_digest(path)?]);
    }
    let mut files = Vec::new();
    collect_files(path, &mut files)?;
    files.sort();
    files.iter().map(|p| file_digest(p)).collect()
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if !path.to_string_lossy().ends_with(TEMP_SUFFIX) {
            out.push(path);
        }
    }
    Ok(())
}
