//! libcurl-backed transport: one blocking easy handle per request.

use std::cell::RefCell;
use std::str;
use std::time::Duration;

use crate::retry::FetchError;

use super::head::parse_head;
use super::{BodySink, FetchRequest, ResponseHead, Transport};

const DEFAULT_USER_AGENT: &str = concat!("hoard/", env!("CARGO_PKG_VERSION"));

/// Session-wide settings shared by every request.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub user_agent: String,
    /// `Cookie` header value for the pre-authenticated session.
    pub cookie: Option<String>,
    pub connect_timeout: Duration,
    /// Used when a request does not set its own timeout.
    pub default_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            connect_timeout: Duration::from_secs(15),
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking HTTP transport. Cheap to share: holds only options, handles are per request.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: TransportOptions,
}

impl CurlTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    fn configure(&self, easy: &mut curl::easy::Easy, request: &FetchRequest) -> Result<(), curl::Error> {
        easy.url(&request.url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.options.user_agent)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        // Abort if throughput drops below 1 KiB/s for 60s rather than relying on wall clock alone.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        easy.timeout(request.timeout.unwrap_or(self.options.default_timeout))?;
        if let Some(sz) = request.buffer_size {
            easy.buffer_size(sz)?;
        }
        if let Some(cookie) = &self.options.cookie {
            easy.cookie(cookie)?;
        }

        let mut list = curl::easy::List::new();
        for (k, v) in &request.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if let Some(range) = request.range_header() {
            list.append(&format!("Range: {}", range))?;
        }
        easy.http_headers(list)?;
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn get(
        &self,
        request: &FetchRequest,
        sink: &mut dyn BodySink,
    ) -> Result<ResponseHead, FetchError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, request)?;

        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let delivered: RefCell<Option<ResponseHead>> = RefCell::new(None);
        let failure: RefCell<Option<FetchError>> = RefCell::new(None);

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let s = s.trim_end();
                    let mut lines = lines.borrow_mut();
                    // A new status line starts the headers of the next response in a redirect chain.
                    if s.starts_with("HTTP/") {
                        lines.clear();
                    }
                    if !s.is_empty() {
                        lines.push(s.to_string());
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                if delivered.borrow().is_none() {
                    let head = parse_head(&lines.borrow());
                    if let Err(e) = sink.on_head(&head) {
                        *failure.borrow_mut() = Some(e);
                        return Ok(0);
                    }
                    *delivered.borrow_mut() = Some(head);
                }
                match sink.on_chunk(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        *failure.borrow_mut() = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })?;
            let performed = transfer.perform();
            if let Some(e) = failure.borrow_mut().take() {
                return Err(e);
            }
            performed?;
        }

        let code = easy.response_code()?;
        let head = match delivered.into_inner() {
            Some(mut head) => {
                head.status = code;
                head
            }
            None => {
                let mut head = parse_head(&lines.into_inner());
                head.status = code;
                sink.on_head(&head)?;
                head
            }
        };
        tracing::trace!(url = %request.url, status = head.status, "GET done");
        Ok(head)
    }
}
