//! `hoard checksum` – SHA-256 of cached files.

use anyhow::Result;
use hoard_core::checksum;
use std::path::Path;

/// Print `sha256  size  path` for the file or every file under the directory.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let path = path.to_path_buf();
    let digests = tokio::task::spawn_blocking(move || checksum::digest_path(&path)).await??;
    for d in digests {
        println!("{}  {:>12}  {}", d.sha256, d.size, d.path.display());
    }
    Ok(())
}
