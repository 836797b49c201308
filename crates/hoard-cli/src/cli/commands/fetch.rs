//! `hoard fetch` – one resumable download, no catalog involved.

use anyhow::Result;
use hoard_core::config::HoardConfig;
use hoard_core::context::RunContext;
use hoard_core::downloader::{
    AcceptAll, DownloadOptions, DownloadOutcome, ResumableDownloader, StreamDescriptor,
};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run_fetch(cfg: HoardConfig, url: String, dest: PathBuf, min_bytes: u64) -> Result<()> {
    let ctx = RunContext::from_config(cfg)?;
    let downloader = plain_downloader(&ctx, min_bytes);
    let source = StreamDescriptor::new(url);
    let target = dest.clone();
    let outcome =
        tokio::task::spawn_blocking(move || downloader.download(&source, &target)).await??;
    match outcome {
        DownloadOutcome::AlreadyPresent => println!("{} already present", dest.display()),
        DownloadOutcome::Completed {
            bytes,
            resumed_from,
        } => {
            if resumed_from > 0 {
                println!(
                    "{}: {} bytes (resumed at {})",
                    dest.display(),
                    bytes,
                    resumed_from
                );
            } else {
                println!("{}: {} bytes", dest.display(), bytes);
            }
        }
    }
    Ok(())
}

/// Arbitrary files: no media probe, size floor from the command line.
fn plain_downloader(ctx: &RunContext, min_bytes: u64) -> ResumableDownloader {
    let mut options = DownloadOptions::from(&ctx.config().download_config());
    options.min_payload_bytes = min_bytes;
    ResumableDownloader::new(ctx.transport(), ctx.config().retry_policy(), options)
        .with_probe(Arc::new(AcceptAll))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_core::transport::{CurlTransport, Transport};

    #[test]
    fn small_existing_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("notes.txt");
        std::fs::write(&dest, b"short text file").unwrap();
        let transport: Arc<dyn Transport> = Arc::new(CurlTransport::default());
        let ctx = RunContext::new(HoardConfig::default(), transport);

        let downloader = plain_downloader(&ctx, 0);
        assert_eq!(downloader.options().min_payload_bytes, 0);
        let out = downloader
            .download(&StreamDescriptor::new("http://127.0.0.1:9/unused"), &dest)
            .unwrap();

        assert_eq!(out, DownloadOutcome::AlreadyPresent);
        assert_eq!(std::fs::read(&dest).unwrap(), b"short text file");
    }
}
