//! CLI command handlers, one per file.

mod checksum;
mod collect;
mod config;
mod failures;
mod fetch;

pub use checksum::run_checksum;
pub use collect::{run_collect, CollectArgs};
pub use config::run_config;
pub use failures::run_failures;
pub use fetch::run_fetch;
