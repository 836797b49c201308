//! Rows stored in the ledger.

pub type RunId = i64;

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    /// An item stage during the walk (listing entry, `info.json`, enqueue).
    Item,
    /// A background download job.
    Job,
}

impl FailureSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureSource::Item => "item",
            FailureSource::Job => "job",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "job" => FailureSource::Job,
            _ => FailureSource::Item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub id: i64,
    pub run_id: RunId,
    pub source: FailureSource,
    pub item_id: Option<String>,
    pub title: String,
    pub stage: String,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id: RunId,
    pub owner: String,
    pub finished_at: i64,
    pub items: i64,
    pub skipped: i64,
    pub jobs_completed: i64,
    pub jobs_failed: i64,
}
