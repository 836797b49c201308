//! Transfer error type for retry classification.

use thiserror::Error;

/// Error returned by a single remote fetch or transfer attempt.
/// Kept typed (rather than anyhow) so the retry loop can classify it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a status the caller cannot use.
    #[error("HTTP {0}")]
    Http(u32),
    /// Response was well-formed HTTP but its payload is not what we asked for
    /// (error page disguised as a payload, unparsable JSON, remote error code).
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Transfer ended but the bytes on disk do not match the declared size.
    #[error("size mismatch: expected {expected} bytes, have {actual}")]
    Integrity { expected: u64, actual: u64 },
    /// Disk/storage failure (e.g. disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}

impl FetchError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        FetchError::Malformed(msg.into())
    }
}
