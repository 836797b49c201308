use std::fmt;

use crate::queue::{JobFailure, QueueReport};

/// Result of one per-item stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Done(T),
    /// Unavailable this run; the next run tries again.
    Empty(String),
    /// Fatal for this item only.
    Skip(String),
}

impl<T> StageOutcome<T> {
    pub fn from_option(value: Option<T>, reason: impl Into<String>) -> Self {
        match value {
            Some(v) => StageOutcome::Done(v),
            None => StageOutcome::Empty(reason.into()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StageOutcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            StageOutcome::Done(v) => Some(v),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            StageOutcome::Done(_) => None,
            StageOutcome::Empty(r) | StageOutcome::Skip(r) => Some(r),
        }
    }
}

/// Per-item processing stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Listing,
    Access,
    Cover,
    Comments,
    Captions,
    Info,
    Video,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Listing => "listing",
            Stage::Access => "access",
            Stage::Cover => "cover",
            Stage::Comments => "comments",
            Stage::Captions => "captions",
            Stage::Info => "info",
            Stage::Video => "video",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub item_id: String,
    pub title: String,
    pub stage: Stage,
    pub message: String,
}

/// Summary of one collection run.
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub folders: usize,
    pub pages: usize,
    pub items_processed: usize,
    pub items_skipped: usize,
    /// Items processed with at least one sub-resource unavailable.
    pub items_incomplete: usize,
    pub jobs_enqueued: usize,
    pub jobs_completed: usize,
    pub failures: Vec<ItemFailure>,
    pub job_failures: Vec<JobFailure>,
}

impl WalkReport {
    pub(crate) fn absorb_queue(&mut self, queue: QueueReport) {
        self.jobs_completed += queue.completed;
        self.job_failures.extend(queue.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.job_failures.is_empty()
    }
}

impl fmt::Display for WalkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folders, {} pages, {} items ({} skipped, {} incomplete), {} downloads ({} ok, {} failed)",
            self.folders,
            self.pages,
            self.items_processed,
            self.items_skipped,
            self.items_incomplete,
            self.jobs_enqueued,
            self.jobs_completed,
            self.job_failures.len()
        )
    }
}
