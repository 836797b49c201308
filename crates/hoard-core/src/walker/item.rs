//! Per-item stages: access check, cover, comments, captions, `info.json`, video job.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheKey, ContentCache};
use crate::downloader::{DownloadOutcome, ResumableDownloader};
use crate::queue::{Job, TaskQueue};

use super::api::{CatalogApi, ItemStream};
use super::model::{describe_raw, Item};
use super::outcome::{ItemFailure, Stage, StageOutcome};

pub const INFO_FILE: &str = "info.json";
pub const COMMENTS_FILE: &str = "comments.json";
pub const CAPTIONS_FILE: &str = "captions.xml";
pub const COVER_FILE: &str = "cover.jpg";
pub const VIDEO_FILE: &str = "video.mp4";

/// Contents of `<item>/info.json`, read by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cover_url: Option<String>,
    /// File name of the cached cover, relative to the item directory.
    pub cover_file: Option<String>,
    pub comments: Option<Value>,
    pub captions: Option<String>,
    pub video_file: String,
    /// Stage name → reason, for sub-resources missing this run.
    #[serde(default)]
    pub unavailable: BTreeMap<String, String>,
}

/// What happened to one listing entry.
#[derive(Debug, Default)]
pub(crate) struct ItemReport {
    pub skipped: bool,
    pub incomplete: bool,
    pub enqueued: bool,
    pub failures: Vec<ItemFailure>,
}

/// Everything a page worker needs to process items.
pub(crate) struct ItemContext<'a> {
    pub api: &'a Arc<dyn CatalogApi>,
    pub cache: &'a ContentCache,
    pub downloader: &'a ResumableDownloader,
    pub queue: &'a TaskQueue,
}

impl ItemContext<'_> {
    pub fn process(&self, raw: &Value) -> ItemReport {
        let mut report = ItemReport::default();
        let item = match Item::from_value(raw) {
            Ok(item) => item,
            Err(reason) => {
                let (item_id, title) = describe_raw(raw);
                tracing::warn!(item = %item_id, "skipping entry: {}", reason);
                report.skipped = true;
                report.failures.push(ItemFailure {
                    item_id,
                    title,
                    stage: Stage::Listing,
                    message: reason,
                });
                return report;
            }
        };
        if let StageOutcome::Skip(reason) = self.access(&item) {
            tracing::warn!(item = %item.id, "item not accessible, skipping {}: {}", item.label(), reason);
            report.skipped = true;
            report.failures.push(failure(&item, Stage::Access, reason));
            return report;
        }
        tracing::info!(item = %item.id, "processing {}", item.label());

        let cover = self.cover(&item);
        let comments = self.comments(&item);
        let captions = self.captions(&item);

        let mut unavailable = BTreeMap::new();
        for (stage, reason) in [
            (Stage::Cover, cover.reason()),
            (Stage::Comments, comments.reason()),
            (Stage::Captions, captions.reason()),
        ] {
            if let Some(reason) = reason {
                tracing::warn!(item = %item.id, stage = %stage, "unavailable: {}", reason);
                unavailable.insert(stage.to_string(), reason.to_string());
            }
        }
        report.incomplete = !unavailable.is_empty();

        let record = ItemRecord {
            id: item.id.clone(),
            title: item.title.clone(),
            description: item.intro.clone(),
            cover_url: item.cover.clone(),
            cover_file: cover.done().map(|_| COVER_FILE.to_string()),
            comments: comments.done(),
            captions: captions
                .done()
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
            video_file: VIDEO_FILE.to_string(),
            unavailable,
        };
        if let Err(e) = self.cache.put(&key(&item, INFO_FILE), &record) {
            tracing::error!(item = %item.id, "writing {} failed: {:#}", INFO_FILE, e);
            report.skipped = true;
            report.failures.push(failure(&item, Stage::Info, format!("{:#}", e)));
            return report;
        }

        match self.enqueue_video(&item) {
            StageOutcome::Done(()) => report.enqueued = true,
            StageOutcome::Empty(_) => {}
            StageOutcome::Skip(reason) => {
                report.failures.push(failure(&item, Stage::Video, reason));
            }
        }
        report
    }

    fn access(&self, item: &Item) -> StageOutcome<()> {
        match self.api.check_access(item) {
            Ok(()) => StageOutcome::Done(()),
            Err(e) => StageOutcome::Skip(format!("{:#}", e)),
        }
    }

    fn cover(&self, item: &Item) -> StageOutcome<()> {
        if item.cover.is_none() {
            return StageOutcome::Empty("no cover url".to_string());
        }
        let bytes = self.cache.get_or_fetch_bytes(
            false,
            &key(item, COVER_FILE),
            |b| !b.is_empty(),
            || self.api.fetch_cover(item),
        );
        StageOutcome::from_option(bytes.map(|_| ()), "cover unavailable")
    }

    fn comments(&self, item: &Item) -> StageOutcome<Value> {
        let comments =
            self.cache
                .get_or_fetch(false, &key(item, COMMENTS_FILE), || self.api.fetch_comments(item));
        StageOutcome::from_option(comments, "comments unavailable")
    }

    fn captions(&self, item: &Item) -> StageOutcome<Vec<u8>> {
        if item.caption_id.is_none() {
            return StageOutcome::Empty("no captions".to_string());
        }
        let bytes = self.cache.get_or_fetch_bytes(
            false,
            &key(item, CAPTIONS_FILE),
            acceptable_captions,
            || self.api.fetch_captions(item),
        );
        StageOutcome::from_option(bytes, "captions unavailable")
    }

    /// Queue the video download unless `video.mp4` is already in place.
    fn enqueue_video(&self, item: &Item) -> StageOutcome<()> {
        let destination: PathBuf = self.cache.path_for(&key(item, VIDEO_FILE));
        if destination.exists() {
            return StageOutcome::Empty("already downloaded".to_string());
        }
        let label = item.label();
        let source = ItemStream::new(Arc::clone(self.api), item.clone());
        let downloader = self.downloader.clone();
        let job = Job::new(label.clone(), move || {
            match downloader.download(&source, &destination)? {
                DownloadOutcome::AlreadyPresent => {
                    tracing::info!(path = %destination.display(), "video already present")
                }
                DownloadOutcome::Completed { bytes, resumed_from } => tracing::info!(
                    path = %destination.display(),
                    bytes,
                    resumed_from,
                    "video downloaded"
                ),
            }
            Ok(())
        });
        match self.queue.enqueue(job) {
            Ok(()) => {
                tracing::info!(item = %item.id, "queued download {}", label);
                StageOutcome::Done(())
            }
            Err(e) => StageOutcome::Skip(format!("{:#}", e)),
        }
    }
}

fn key(item: &Item, name: &str) -> CacheKey {
    CacheKey::new(&item.id, name)
}

fn failure(item: &Item, stage: Stage, message: String) -> ItemFailure {
    ItemFailure {
        item_id: item.id.clone(),
        title: item.title.clone(),
        stage,
        message,
    }
}

/// Caption streams come back as an HTML page when the remote blocks the request.
pub(crate) fn acceptable_captions(body: &[u8]) -> bool {
    let trimmed = body.trim_ascii_start();
    !trimmed.is_empty() && !trimmed.get(..6).is_some_and(|p| p.eq_ignore_ascii_case(b"<html>"))
}
