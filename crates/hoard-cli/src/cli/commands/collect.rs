//! `hoard collect` – walk the catalog, then record the run in the ledger.

use anyhow::{Context, Result};
use hoard_core::catalog::TemplateCatalog;
use hoard_core::config::HoardConfig;
use hoard_core::context::RunContext;
use hoard_core::ledger::Ledger;
use hoard_core::walker::{CatalogApi, CollectionWalker, WalkOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::owner;

/// Flags that override config for one run.
#[derive(Debug, Default)]
pub struct CollectArgs {
    pub owner: Option<String>,
    pub force_refresh: bool,
    pub workers: Option<usize>,
    pub page_workers: Option<usize>,
    pub cache_dir: Option<PathBuf>,
}

impl CollectArgs {
    fn apply(&self, cfg: &mut HoardConfig) {
        if let Some(n) = self.workers {
            cfg.workers = n.max(1);
        }
        if let Some(n) = self.page_workers {
            cfg.page_workers = n.max(1);
        }
        if let Some(dir) = &self.cache_dir {
            cfg.cache_dir = Some(dir.clone());
        }
    }
}

pub async fn run_collect(mut cfg: HoardConfig, args: CollectArgs) -> Result<()> {
    args.apply(&mut cfg);
    let remote = cfg
        .remote
        .clone()
        .context("no [remote] section in config; run `hoard config` to see the file path")?;
    let owner = owner::resolve_owner(args.owner.clone(), &owner::default_owner_path()?)?;
    let ledger = Ledger::open_default().await?;

    let ctx = RunContext::from_config(cfg)?;
    let api: Arc<dyn CatalogApi> = Arc::new(TemplateCatalog::new(
        ctx.transport(),
        remote,
        ctx.config().request_timeout(),
    ));
    let mut options = WalkOptions::from_context(&ctx, owner.clone());
    options.force_refresh = args.force_refresh;
    let walker = CollectionWalker::new(&ctx, api, options)?;

    tracing::info!(
        owner = %owner,
        cache = %ctx.cache_root().display(),
        "starting collection"
    );
    let started = Instant::now();
    let report = tokio::task::spawn_blocking(move || walker.run()).await??;

    let run_id = ledger.record_report(&owner, &report).await?;
    println!("{} in {:.1}s", report, started.elapsed().as_secs_f64());
    if !report.is_clean() {
        println!(
            "{} failure(s) recorded as run #{}; see `hoard failures`",
            report.failures.len() + report.job_failures.len(),
            run_id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut cfg = HoardConfig::default();
        let args = CollectArgs {
            workers: Some(0),
            page_workers: Some(8),
            cache_dir: Some(PathBuf::from("/srv/hoard")),
            ..Default::default()
        };
        args.apply(&mut cfg);
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.page_workers, 8);
        assert_eq!(cfg.cache_root(), PathBuf::from("/srv/hoard"));
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut cfg = HoardConfig::default();
        CollectArgs::default().apply(&mut cfg);
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.page_workers, 4);
        assert!(cfg.cache_dir.is_none());
    }
}
