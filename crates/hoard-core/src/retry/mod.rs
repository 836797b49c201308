//! Retry policy.
//!
//! Bounded, fixed-interval retries for transient failures. Errors are
//! classified (timeouts, throttling, connection failures, malformed responses,
//! integrity mismatches, local storage errors) so that higher layers
//! (downloader, catalog fetches) share one policy and log consistent reasons.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status, Classify};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
