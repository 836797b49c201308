//! Minimal HTTP/1.1 server with per-path routes and `Range: bytes=N-` support.
//!
//! Each route serves a static body. Ranged GETs get 206 with `Content-Range`,
//! out-of-range starts get 416, and a route can be told to drop the
//! connection part-way through its first response.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Close the connection after this many body bytes, on the first GET only.
    pub cut_first_after: Option<usize>,
}

impl Route {
    pub fn binary(body: Vec<u8>) -> Self {
        Self {
            body,
            content_type: "application/octet-stream",
            support_ranges: true,
            cut_first_after: None,
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into().into_bytes(),
            content_type: "application/json",
            support_ranges: false,
            cut_first_after: None,
        }
    }
}

#[derive(Default)]
struct State {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, usize>>,
    requests: AtomicUsize,
}

/// Handle to a running server. The server thread lives until the process exits.
#[derive(Clone)]
pub struct RangeServer {
    base: String,
    state: Arc<State>,
}

impl RangeServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(State::default());
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// `path` must start with `/`.
    pub fn route(&self, path: &str, route: Route) -> String {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), route);
        self.url(path)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, target, range_start) = parse_request(request);
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }

    let route = {
        let mut routes = state.routes.lock().unwrap();
        let mut hits = state.hits.lock().unwrap();
        *hits.entry(target.to_string()).or_insert(0) += 1;
        match routes.get_mut(target) {
            Some(r) => {
                let snapshot = r.clone();
                r.cut_first_after = None;
                Some(snapshot)
            }
            None => None,
        }
    };
    let Some(route) = route else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    };

    let total = route.body.len();
    let (status, content_range, slice) = match range_start {
        Some(start) if route.support_ranges => {
            if start >= total as u64 {
                let head = format!(
                    "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    total
                );
                let _ = stream.write_all(head.as_bytes());
                return;
            }
            let start = start as usize;
            (
                "206 Partial Content",
                Some(format!("bytes {}-{}/{}", start, total - 1, total)),
                &route.body[start..],
            )
        }
        _ => ("200 OK", None, &route.body[..]),
    };

    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        route.content_type,
        slice.len()
    );
    if let Some(cr) = content_range {
        head.push_str(&format!("Content-Range: {}\r\n", cr));
    }
    if route.support_ranges {
        head.push_str("Accept-Ranges: bytes\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());

    match route.cut_first_after {
        Some(limit) if limit < slice.len() => {
            let _ = stream.write_all(&slice[..limit]);
            let _ = stream.flush();
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        _ => {
            let _ = stream.write_all(slice);
        }
    }
}

/// Returns (method, path, optional start of `Range: bytes=N-`).
fn parse_request(request: &str) -> (&str, &str, Option<u64>) {
    let mut method = "";
    let mut target = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            target = parts.next().unwrap_or("/");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if value.to_lowercase().starts_with("bytes=") {
                    if let Some((a, _)) = value[6..].split_once('-') {
                        range = a.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (method, target, range)
}
