//! Classify HTTP status, curl errors and fetch errors into retry error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Anything the retry loop can classify.
pub trait Classify {
    fn error_kind(&self) -> ErrorKind;
}

impl Classify for FetchError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            FetchError::Curl(e) => classify_curl_error(e),
            FetchError::Http(code) => classify_http_status(*code),
            FetchError::Malformed(_) => ErrorKind::Malformed,
            FetchError::Integrity { .. } => ErrorKind::Integrity,
            FetchError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl Classify for anyhow::Error {
    fn error_kind(&self) -> ErrorKind {
        if let Some(e) = self.downcast_ref::<FetchError>() {
            return e.error_kind();
        }
        if self.downcast_ref::<std::io::Error>().is_some() {
            return ErrorKind::Storage;
        }
        ErrorKind::Other
    }
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        _ => ErrorKind::Http(code.min(u16::MAX as u32) as u16),
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}
