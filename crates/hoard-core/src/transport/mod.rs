//! Remote fetch capability.
//!
//! Everything the pipeline reads from the network goes through [`Transport`]:
//! `fetch(url, headers, range) -> (status, body stream, length)`. The body is
//! pushed into a [`BodySink`] so large payloads never sit in memory.

mod cookies;
mod http;
mod head;

pub use self::cookies::{cookie_header, load_cookie_jar};
pub use self::http::{CurlTransport, TransportOptions};
pub use self::head::parse_head;

use std::time::Duration;

use crate::retry::FetchError;

/// One GET request.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub url: String,
    /// Extra headers as (name, value).
    pub headers: Vec<(String, String)>,
    /// Request bytes from this offset onward (`Range: bytes=N-`).
    pub range_from: Option<u64>,
    /// Per-request timeout; the transport default applies when `None`.
    pub timeout: Option<Duration>,
    /// Receive buffer size hint; bounds the size of each chunk handed to the sink.
    pub buffer_size: Option<usize>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn range_header(&self) -> Option<String> {
        self.range_from.map(|off| format!("bytes={}-", off))
    }
}

/// Status line and the headers the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u32,
    /// Bytes in this response body (`Content-Length`).
    pub content_length: Option<u64>,
    /// First byte offset from `Content-Range: bytes a-b/total`.
    pub range_start: Option<u64>,
    /// Full resource size from `Content-Range: bytes a-b/total`.
    pub range_total: Option<u64>,
    pub content_type: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Receives a streamed response.
///
/// `on_head` is called exactly once, before any chunk and also for empty
/// bodies. An error from either callback aborts the transfer and is returned
/// from [`Transport::get`] unchanged.
pub trait BodySink {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), FetchError>;
    fn on_chunk(&mut self, data: &[u8]) -> Result<(), FetchError>;
}

/// The abstract remote. Implementations carry the authenticated session.
pub trait Transport: Send + Sync {
    fn get(&self, request: &FetchRequest, sink: &mut dyn BodySink)
        -> Result<ResponseHead, FetchError>;

    /// Fetch a small body into memory.
    fn get_bytes(&self, request: &FetchRequest) -> Result<(ResponseHead, Vec<u8>), FetchError> {
        let mut sink = BufferSink::default();
        let head = self.get(request, &mut sink)?;
        Ok((head, sink.body))
    }
}

/// Collects the body into memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub body: Vec<u8>,
}

impl BodySink for BufferSink {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), FetchError> {
        if let Some(len) = head.content_length {
            self.body.reserve(len.min(16 * 1024 * 1024) as usize);
        }
        Ok(())
    }

    fn on_chunk(&mut self, data: &[u8]) -> Result<(), FetchError> {
        self.body.extend_from_slice(data);
        Ok(())
    }
}

/// Fetch a small resource and insist on a 2xx status.
pub fn get_ok(transport: &dyn Transport, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
    let (head, body) = transport.get_bytes(request)?;
    if !head.is_success() {
        return Err(FetchError::Http(head.status));
    }
    Ok(body)
}
