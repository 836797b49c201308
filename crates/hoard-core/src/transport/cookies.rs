//! Pre-authenticated session: a saved cookie jar turned into a `Cookie` header.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Read a JSON `{"name": "value"}` cookie map.
pub fn load_cookie_jar(path: &Path) -> Result<BTreeMap<String, String>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read cookie jar: {}", path.display()))?;
    let jar: BTreeMap<String, String> = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse cookie jar: {}", path.display()))?;
    Ok(jar)
}

/// Render a cookie map as a `Cookie` header value (`a=1; b=2`).
pub fn cookie_header(jar: &BTreeMap<String, String>) -> String {
    jar.iter()
        .map(|(k, v)| format!("{}={}", k.trim(), v.trim()))
        .collect::<Vec<_>>()
        .join("; ")
}
