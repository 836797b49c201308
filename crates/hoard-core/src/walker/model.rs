//! Catalog records as the remote returns them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cache::PayloadStatus;

/// `{"code": 0, "message": "...", "data": {...}}` wrapper around every listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: None,
            data: Some(data),
        }
    }

    pub fn error(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T> PayloadStatus for Envelope<T> {
    fn failure(&self) -> Option<String> {
        if self.code != 0 {
            return Some(format!(
                "code {}: {}",
                self.code,
                self.message.as_deref().unwrap_or("no message")
            ));
        }
        if self.data.is_none() {
            return Some("response carries no data".to_string());
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FolderList {
    #[serde(default)]
    pub folders: Vec<Folder>,
}

/// One listing page. Items stay raw so one malformed entry only skips itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default = "more_by_default")]
    pub has_more: bool,
}

fn more_by_default() -> bool {
    true
}

/// A catalog entry that passed validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub caption_id: Option<String>,
}

impl Item {
    /// Validate a raw listing entry. The error is a short reason for the skip record.
    pub fn from_value(raw: &Value) -> Result<Item, String> {
        let item: Item = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
        if !is_path_safe(&item.id) {
            return Err(format!("unusable item id {:?}", item.id));
        }
        Ok(item)
    }

    /// `title (id)`, truncated for log lines.
    pub fn label(&self) -> String {
        let mut title: String = self.title.chars().take(40).collect();
        if title.len() < self.title.len() {
            title.push_str("...");
        }
        format!("{} ({})", title, self.id)
    }
}

/// Best-effort id and title of an entry that failed validation.
pub(crate) fn describe_raw(raw: &Value) -> (String, String) {
    let id = match raw.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "?".to_string(),
    };
    let title = raw
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    (id, title)
}

/// Ids become directory names under the cache root.
pub(crate) fn is_path_safe(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> String {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Remotes disagree on whether ids are numbers or strings.
fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_accepts_numeric_ids() {
        let item = Item::from_value(&json!({
            "id": 170001, "title": "clip", "caption_id": 9
        }))
        .unwrap();
        assert_eq!(item.id, "170001");
        assert_eq!(item.caption_id.as_deref(), Some("9"));
        assert_eq!(item.intro, "");
        assert!(item.cover.is_none());
    }

    #[test]
    fn item_missing_title_is_rejected() {
        let err = Item::from_value(&json!({"id": "a1"})).unwrap_err();
        assert!(err.contains("title"), "{}", err);
    }

    #[test]
    fn item_with_traversal_id_is_rejected() {
        assert!(Item::from_value(&json!({"id": "../x", "title": "t"})).is_err());
        assert!(Item::from_value(&json!({"id": "..", "title": "t"})).is_err());
    }

    #[test]
    fn envelope_status() {
        let ok: Envelope<FolderList> = Envelope::ok(FolderList::default());
        assert!(ok.failure().is_none());
        let bad: Envelope<FolderList> =
            serde_json::from_value(json!({"code": -101, "message": "not logged in"})).unwrap();
        assert!(bad.failure().unwrap().contains("not logged in"));
        let empty: Envelope<FolderList> = serde_json::from_value(json!({"code": 0})).unwrap();
        assert!(empty.failure().is_some());
    }

    #[test]
    fn page_defaults_to_more() {
        let page: Page = serde_json::from_value(json!({"items": [{"id": 1}]})).unwrap();
        assert!(page.has_more);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn describe_raw_handles_partial_entries() {
        assert_eq!(describe_raw(&json!({"id": 5})), ("5".into(), "".into()));
        assert_eq!(describe_raw(&json!({"title": "x"})), ("?".into(), "x".into()));
    }

    #[test]
    fn label_truncates_long_titles() {
        let item = Item {
            id: "1".into(),
            title: "a".repeat(60),
            intro: String::new(),
            cover: None,
            caption_id: None,
        };
        let label = item.label();
        assert!(label.ends_with("... (1)"));
    }
}
