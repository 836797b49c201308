//! Catalog walk: folders → pages → items.
//!
//! Listings and small per-item resources are fetched synchronously through
//! the [`ContentCache`]; video downloads are queued on a [`TaskQueue`] and run
//! in the background while the walk continues. The walk ends by draining the
//! queue and returning a [`WalkReport`].

mod api;
mod item;
mod model;
mod outcome;

pub use api::{CatalogApi, ItemStream};
pub use item::{ItemRecord, CAPTIONS_FILE, COMMENTS_FILE, COVER_FILE, INFO_FILE, VIDEO_FILE};
pub use model::{Envelope, Folder, FolderList, Item, Page};
pub use outcome::{ItemFailure, Stage, StageOutcome, WalkReport};

use anyhow::Result;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{CacheKey, ContentCache};
use crate::context::RunContext;
use crate::downloader::ResumableDownloader;
use crate::queue::TaskQueue;

use item::{ItemContext, ItemReport};

pub const FOLDERS_FILE: &str = "folders.json";

/// Per-run knobs; defaults come from config, the CLI may override them.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub owner: String,
    pub force_refresh: bool,
    pub workers: usize,
    pub page_workers: usize,
    pub page_delay: Duration,
}

impl WalkOptions {
    pub fn from_context(ctx: &RunContext, owner: impl Into<String>) -> Self {
        let cfg = ctx.config();
        Self {
            owner: owner.into(),
            force_refresh: false,
            workers: cfg.workers,
            page_workers: cfg.page_workers,
            page_delay: cfg.page_delay(),
        }
    }
}

pub struct CollectionWalker {
    api: Arc<dyn CatalogApi>,
    cache: ContentCache,
    downloader: ResumableDownloader,
    options: WalkOptions,
}

impl CollectionWalker {
    pub fn new(ctx: &RunContext, api: Arc<dyn CatalogApi>, options: WalkOptions) -> Result<Self> {
        if !model::is_path_safe(&options.owner) {
            anyhow::bail!("owner id {:?} cannot be used as a directory name", options.owner);
        }
        let cache = ContentCache::new(ctx.cache_root().join(&options.owner));
        Ok(Self {
            api,
            cache,
            downloader: ctx.downloader(),
            options,
        })
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Walk every folder and page, then wait for all queued downloads.
    ///
    /// Fails only when the folder list cannot be obtained; everything below
    /// that is isolated per item and reported.
    pub fn run(&self) -> Result<WalkReport> {
        let queue = TaskQueue::new(self.options.workers);
        let mut report = WalkReport::default();
        let mut force_refresh = self.options.force_refresh;

        let folders_key = CacheKey::new("", FOLDERS_FILE);
        let owner = self.options.owner.as_str();
        let mut folders = self
            .cache
            .get_or_fetch(force_refresh, &folders_key, || self.api.list_folders(owner));
        if folders.is_none() && !force_refresh {
            tracing::warn!(owner, "folder list unavailable, retrying with refresh");
            force_refresh = true;
            folders = self
                .cache
                .get_or_fetch(force_refresh, &folders_key, || self.api.list_folders(owner));
        }
        let folders = folders
            .and_then(|env| env.data)
            .ok_or_else(|| anyhow::anyhow!("could not fetch folder list for owner {}", owner))?
            .folders;
        tracing::info!(owner, folders = folders.len(), "walking catalog");

        for folder in &folders {
            if !model::is_path_safe(&folder.id) {
                tracing::warn!(folder = %folder.id, "skipping folder with unusable id");
                continue;
            }
            report.folders += 1;
            self.walk_folder(folder, force_refresh, &queue, &mut report);
        }

        tracing::info!(pending = queue.pending(), "catalog walked, waiting for downloads");
        queue.drain();
        report.absorb_queue(queue.shutdown());
        tracing::info!("run finished: {}", report);
        Ok(report)
    }

    fn walk_folder(
        &self,
        folder: &Folder,
        force_refresh: bool,
        queue: &TaskQueue,
        report: &mut WalkReport,
    ) {
        tracing::info!(folder = %folder.id, "folder {}", folder.title);
        let mut page = 1u32;
        loop {
            let key = CacheKey::new("", format!("{}_{}.json", folder.id, page));
            let listing = self
                .cache
                .get_or_fetch(force_refresh, &key, || self.api.list_page(&folder.id, page))
                .and_then(|env| env.data);
            let Some(listing) = listing else {
                tracing::warn!(folder = %folder.id, page, "page unavailable, moving on");
                break;
            };
            if listing.items.is_empty() {
                break;
            }
            report.pages += 1;
            tracing::info!(folder = %folder.id, page, items = listing.items.len(), "page");
            self.process_page(listing.items, queue, report);

            if !listing.has_more {
                break;
            }
            page += 1;
            if !self.options.page_delay.is_zero() {
                std::thread::sleep(self.options.page_delay);
            }
        }
    }

    /// Run the page's items on a bounded set of scoped threads and fold the results in.
    fn process_page(&self, items: Vec<Value>, queue: &TaskQueue, report: &mut WalkReport) {
        let ctx = ItemContext {
            api: &self.api,
            cache: &self.cache,
            downloader: &self.downloader,
            queue,
        };
        let workers = self.options.page_workers.max(1).min(items.len());
        let work: Mutex<VecDeque<Value>> = Mutex::new(items.into());

        let results: Vec<ItemReport> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(|| {
                        let mut done = Vec::new();
                        loop {
                            let next = work.lock().unwrap().pop_front();
                            let Some(raw) = next else { break };
                            done.push(ctx.process(&raw));
                        }
                        done
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(done) => done,
                    Err(_) => {
                        tracing::error!("page worker panicked");
                        Vec::new()
                    }
                })
                .collect()
        });

        for r in results {
            if r.skipped {
                report.items_skipped += 1;
            } else {
                report.items_processed += 1;
            }
            if r.incomplete {
                report.items_incomplete += 1;
            }
            if r.enqueued {
                report.jobs_enqueued += 1;
            }
            report.failures.extend(r.failures);
        }
    }
}
