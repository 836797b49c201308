//! Success/failure status carried inside fetched payloads.

use serde_json::Value;

/// Payloads that can report an upstream failure despite a successful transfer.
pub trait PayloadStatus {
    /// `None` when the payload is a success, otherwise a short reason.
    fn failure(&self) -> Option<String>;
}

/// JSON records: a numeric `code` must be 0, a string `status` must be `"ok"`.
/// Anything without either field is taken as success.
impl PayloadStatus for Value {
    fn failure(&self) -> Option<String> {
        let obj = self.as_object()?;
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no message");
        if let Some(code) = obj.get("code") {
            return match code.as_i64() {
                Some(0) => None,
                Some(c) => Some(format!("code {}: {}", c, message)),
                None => Some(format!("non-numeric code {}", code)),
            };
        }
        if let Some(status) = obj.get("status") {
            return match status.as_str() {
                Some("ok") => None,
                _ => Some(format!("status {}: {}", status, message)),
            };
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn code_zero_is_success() {
        assert!(json!({"code": 0, "data": []}).failure().is_none());
        let f = json!({"code": -404, "message": "closed"}).failure().unwrap();
        assert!(f.contains("-404"));
        assert!(f.contains("closed"));
    }

    #[test]
    fn status_ok_is_success() {
        assert!(json!({"status": "ok", "data": [1, 2, 3]}).failure().is_none());
        assert!(json!({"status": "error"}).failure().is_some());
    }

    #[test]
    fn records_without_status_are_success() {
        assert!(json!({"data": 1}).failure().is_none());
        assert!(json!([1, 2]).failure().is_none());
    }

    #[test]
    fn string_code_is_failure() {
        assert!(json!({"code": "0"}).failure().is_some());
    }
}
