//! Retry loop: run a closure until success or policy says stop.

use std::fmt::Display;

use super::classify::Classify;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// On a retryable failure sleeps the policy's fixed delay then tries again.
/// The last error is returned unchanged. `label` only feeds the log lines.
pub fn run_with_retry<T, E, F>(policy: &RetryPolicy, label: &str, mut f: F) -> Result<T, E>
where
    E: Classify + Display,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = e.error_kind();
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            label,
                            attempt,
                            kind = ?kind,
                            delay_ms = d.as_millis() as u64,
                            "attempt failed, retrying: {}",
                            e
                        );
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
