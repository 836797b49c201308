//! In-memory transport for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::retry::FetchError;
use crate::transport::{BodySink, FetchRequest, ResponseHead, Transport};

/// How one URL answers.
#[derive(Debug, Clone, Default)]
pub(crate) struct Served {
    pub body: Vec<u8>,
    /// Answer ranged requests with 206 (otherwise always 200 with the full body).
    pub honor_range: bool,
    /// Force this status (body still sent).
    pub status: Option<u32>,
    /// Advertise this full size instead of `body.len()`.
    pub declared_total: Option<u64>,
    /// Stop after this many body bytes (the rest is silently dropped).
    pub deliver: Option<usize>,
    /// Fail with a connection error after this many bytes, once.
    pub fail_once_after: Option<usize>,
    /// Answer ranged requests from this offset instead of the one asked for.
    pub range_start_at: Option<u64>,
}

impl Served {
    pub fn ranged(body: Vec<u8>) -> Self {
        Self {
            body,
            honor_range: true,
            ..Default::default()
        }
    }

    pub fn plain(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<String, Served>>,
    requests: Mutex<Vec<FetchRequest>>,
    hits: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, served: Served) {
        self.routes.lock().unwrap().insert(url.to_string(), served);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn hits_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn get(
        &self,
        request: &FetchRequest,
        sink: &mut dyn BodySink,
    ) -> Result<ResponseHead, FetchError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let served = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&request.url) {
                Some(s) => {
                    let snapshot = s.clone();
                    s.fail_once_after = None;
                    snapshot
                }
                None => {
                    let head = ResponseHead {
                        status: 404,
                        content_length: Some(0),
                        ..Default::default()
                    };
                    sink.on_head(&head)?;
                    return Ok(head);
                }
            }
        };

        let total = served.declared_total.unwrap_or(served.body.len() as u64);
        let (mut head, slice) = match request.range_from {
            Some(off) if served.honor_range && served.status.is_none() => {
                if off > served.body.len() as u64 {
                    let head = ResponseHead {
                        status: 416,
                        content_length: Some(0),
                        ..Default::default()
                    };
                    sink.on_head(&head)?;
                    return Ok(head);
                }
                let start = served.range_start_at.unwrap_or(off);
                let slice = &served.body[start as usize..];
                let head = ResponseHead {
                    status: 206,
                    content_length: Some(total.saturating_sub(start)),
                    range_start: Some(start),
                    range_total: Some(total),
                    content_type: None,
                };
                (head, slice)
            }
            _ => {
                let head = ResponseHead {
                    status: served.status.unwrap_or(200),
                    content_length: Some(total),
                    ..Default::default()
                };
                (head, &served.body[..])
            }
        };
        let slice = match served.deliver {
            Some(n) => &slice[..n.min(slice.len())],
            None => slice,
        };

        sink.on_head(&head)?;
        let chunk = request.buffer_size.unwrap_or(1024).max(1);
        let mut sent = 0usize;
        for part in slice.chunks(chunk) {
            if let Some(limit) = served.fail_once_after {
                if sent + part.len() > limit {
                    let keep = limit - sent;
                    if keep > 0 {
                        sink.on_chunk(&part[..keep])?;
                    }
                    // CURLE_PARTIAL_FILE
                    return Err(FetchError::Curl(curl::Error::new(18)));
                }
            }
            sink.on_chunk(part)?;
            sent += part.len();
        }
        head.content_type = Some("application/octet-stream".to_string());
        Ok(head)
    }
}

/// Deterministic payload of `len` bytes.
pub(crate) fn payload(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}
