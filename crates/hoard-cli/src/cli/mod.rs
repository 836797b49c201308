//! CLI for hoard.

mod commands;
mod owner;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hoard_core::config;
use std::path::PathBuf;

use commands::{run_checksum, run_collect, run_config, run_failures, run_fetch, CollectArgs};

/// Top-level CLI for hoard.
#[derive(Debug, Parser)]
#[command(name = "hoard")]
#[command(about = "hoard: resumable fetch-and-cache for paginated media catalogs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Walk the catalog and cache every item; videos download in the background.
    Collect {
        /// Catalog owner id. Remembered for later runs.
        #[arg(long, value_name = "ID")]
        owner: Option<String>,
        /// Refetch folder and page listings even when cached.
        #[arg(long)]
        force_refresh: bool,
        /// Background download workers (overrides config).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Parallel item workers per page (overrides config).
        #[arg(long, value_name = "N")]
        page_workers: Option<usize>,
        /// Cache root (overrides config).
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// Download one URL resumably with the configured retry policy.
    Fetch {
        /// Direct HTTP/HTTPS URL.
        url: String,
        /// Destination file; `<DEST>.tmp` holds the partial transfer.
        dest: PathBuf,
        /// Reject responses declaring fewer bytes than this.
        #[arg(long, value_name = "BYTES", default_value_t = 0)]
        min_bytes: u64,
    },

    /// List failures recorded by previous runs.
    Failures {
        /// Delete all recorded failures instead of listing them.
        #[arg(long)]
        clear: bool,
    },

    /// Compute SHA-256 of a file, or of every finished file under a directory.
    Checksum {
        /// File or directory.
        path: PathBuf,
    },

    /// Print the config file path and the effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Collect {
                owner,
                force_refresh,
                workers,
                page_workers,
                cache_dir,
            } => {
                let args = CollectArgs {
                    owner,
                    force_refresh,
                    workers,
                    page_workers,
                    cache_dir,
                };
                run_collect(cfg, args).await?
            }
            CliCommand::Fetch {
                url,
                dest,
                min_bytes,
            } => run_fetch(cfg, url, dest, min_bytes).await?,
            CliCommand::Failures { clear } => run_failures(clear).await?,
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
