//! Run ledger (SQLite via sqlx).
//!
//! Every collection run stores its tally and the items and download jobs that
//! failed, with enough context (item id, title, stage, error) to retry them
//! by hand.

mod db;
mod records;
mod types;

pub use db::Ledger;
pub use types::{FailureRecord, FailureSource, RunId, RunSummary};
