//! Resumable large-payload downloader.
//!
//! Streams one remote payload into `<destination>.tmp`, resuming from whatever
//! a previous attempt left there, checks the declared size, verifies the final
//! length and atomically renames into place. The whole attempt runs under the
//! retry policy; each attempt re-reads the on-disk [`TransferState`] so a
//! retry picks up exactly where the last one stopped.

mod probe;
mod sink;

pub use probe::{AcceptAll, IsoMediaProbe, PayloadProbe};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DownloadConfig;
use crate::retry::{run_with_retry, FetchError, RetryPolicy};
use crate::storage::TransferState;
use crate::transport::{FetchRequest, Transport};

use sink::TransferSink;

/// Direct transfer endpoint for one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub url: String,
    /// Transport headers the remote requires (e.g. `Referer`).
    pub headers: Vec<(String, String)>,
}

impl StreamDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }
}

/// Something that can name itself and resolve to a transfer endpoint.
///
/// Resolution happens inside each attempt, so short-lived signed URLs are
/// refreshed on retry.
pub trait StreamSource: Send + Sync {
    /// Human-readable label for logs and failure records.
    fn label(&self) -> String;
    fn resolve(&self) -> Result<StreamDescriptor, FetchError>;
}

impl StreamSource for StreamDescriptor {
    fn label(&self) -> String {
        self.url.clone()
    }

    fn resolve(&self) -> Result<StreamDescriptor, FetchError> {
        Ok(self.clone())
    }
}

/// Transfer tuning, usually built from [`DownloadConfig`].
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub chunk_size: usize,
    pub min_payload_bytes: u64,
    pub size_tolerance: f64,
    pub transfer_timeout: Duration,
    pub discard_partial_on_error: bool,
    pub progress_interval: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        DownloadOptions::from(&DownloadConfig::default())
    }
}

impl From<&DownloadConfig> for DownloadOptions {
    fn from(cfg: &DownloadConfig) -> Self {
        Self {
            chunk_size: cfg.chunk_size.max(1024),
            min_payload_bytes: cfg.min_payload_bytes,
            size_tolerance: cfg.size_tolerance.max(0.0),
            transfer_timeout: Duration::from_secs(cfg.transfer_timeout_secs.max(1)),
            discard_partial_on_error: cfg.discard_partial_on_error,
            progress_interval: Duration::from_secs(cfg.progress_interval_secs),
        }
    }
}

/// What a successful `download` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Destination already held a valid payload; no request was made.
    AlreadyPresent,
    /// Payload transferred and finalized. `resumed_from` is the offset the last attempt started at.
    Completed { bytes: u64, resumed_from: u64 },
}

/// Streams payloads to disk with resume, size gate and final verification.
#[derive(Clone)]
pub struct ResumableDownloader {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    options: DownloadOptions,
    probe: Arc<dyn PayloadProbe>,
}

impl ResumableDownloader {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, options: DownloadOptions) -> Self {
        Self {
            transport,
            policy,
            options,
            probe: Arc::new(IsoMediaProbe),
        }
    }

    /// Replace the integrity probe used for small pre-existing destinations.
    pub fn with_probe(mut self, probe: Arc<dyn PayloadProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Download `source` to `destination`, retrying per policy.
    pub fn download(
        &self,
        source: &dyn StreamSource,
        destination: &Path,
    ) -> Result<DownloadOutcome, FetchError> {
        let label = source.label();
        run_with_retry(&self.policy, &label, || {
            let state = TransferState::inspect(destination)?;
            let result = self.attempt(source, &state);
            if let Err(e) = &result {
                self.after_failed_attempt(&state, e);
            }
            result
        })
    }

    /// One attempt against the state found on disk.
    fn attempt(
        &self,
        source: &dyn StreamSource,
        state: &TransferState,
    ) -> Result<DownloadOutcome, FetchError> {
        if self.existing_is_valid(&state.destination)? {
            tracing::info!(path = %state.destination.display(), "payload already present, skipping");
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        let descriptor = source.resolve()?;
        let request = FetchRequest {
            url: descriptor.url,
            headers: descriptor.headers,
            range_from: Some(state.resume_offset),
            timeout: Some(self.options.transfer_timeout),
            buffer_size: Some(self.options.chunk_size),
        };
        if state.is_resume() {
            tracing::info!(
                path = %state.destination.display(),
                offset = state.resume_offset,
                "resuming partial transfer"
            );
        }

        let mut sink = TransferSink::new(state, &self.options);
        self.transport.get(&request, &mut sink)?;
        let (writer, declared, offset) = sink.finish()?;

        writer.sync()?;
        let actual = std::fs::metadata(writer.temp_path())?.len();
        if !within_tolerance(actual, declared, self.options.size_tolerance) {
            // The temp file stays; a later attempt resumes it or gets 416 and restarts.
            return Err(FetchError::Integrity {
                expected: declared,
                actual,
            });
        }

        writer.finalize(&state.destination)?;
        tracing::info!(
            path = %state.destination.display(),
            bytes = actual,
            resumed_from = offset,
            "transfer complete"
        );
        Ok(DownloadOutcome::Completed {
            bytes: actual,
            resumed_from: offset,
        })
    }

    /// A destination larger than `min_payload_bytes`, or a smaller one that
    /// passes the probe, is a finished payload. A small one that fails is deleted.
    fn existing_is_valid(&self, destination: &Path) -> Result<bool, FetchError> {
        let len = match std::fs::metadata(destination) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if len > self.options.min_payload_bytes || self.probe.is_valid(destination) {
            return Ok(true);
        }
        tracing::warn!(
            path = %destination.display(),
            bytes = len,
            "existing payload failed integrity probe, re-downloading"
        );
        std::fs::remove_file(destination)?;
        Ok(false)
    }

    fn after_failed_attempt(&self, state: &TransferState, err: &FetchError) {
        if !self.options.discard_partial_on_error {
            return;
        }
        tracing::debug!(path = %state.temp_path.display(), "discarding partial file after: {}", err);
        if let Err(e) = state.discard() {
            tracing::warn!(path = %state.temp_path.display(), "could not remove partial file: {}", e);
        }
    }
}

/// `|actual - declared| <= declared * tolerance` (boundary inclusive).
pub fn within_tolerance(actual: u64, declared: u64, tolerance: f64) -> bool {
    actual.abs_diff(declared) as f64 <= declared as f64 * tolerance
}
