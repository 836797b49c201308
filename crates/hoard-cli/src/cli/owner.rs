//! Remembered catalog owner id (`~/.local/state/hoard/owner.txt`).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn default_owner_path() -> Result<PathBuf> {
    Ok(hoard_core::config::state_dir()?.join("owner.txt"))
}

/// Use `given` (and remember it), or fall back to the remembered id.
pub fn resolve_owner(given: Option<String>, path: &Path) -> Result<String> {
    if let Some(owner) = given {
        let owner = owner.trim().to_string();
        anyhow::ensure!(!owner.is_empty(), "--owner must not be empty");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(path, &owner).with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "remembered owner {}", owner);
        return Ok(owner);
    }
    match std::fs::read_to_string(path) {
        Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Ok(_) => anyhow::bail!("{} is empty; pass --owner ID", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            anyhow::bail!("no owner id remembered yet; pass --owner ID once")
        }
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_owner_is_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("owner.txt");
        assert_eq!(resolve_owner(Some(" 4242\n".into()), &path).unwrap(), "4242");
        assert_eq!(resolve_owner(None, &path).unwrap(), "4242");
    }

    #[test]
    fn later_owner_replaces_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owner.txt");
        resolve_owner(Some("1".into()), &path).unwrap();
        resolve_owner(Some("2".into()), &path).unwrap();
        assert_eq!(resolve_owner(None, &path).unwrap(), "2");
    }

    #[test]
    fn missing_owner_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_owner(None, &dir.path().join("owner.txt")).unwrap_err();
        assert!(err.to_string().contains("--owner"));
        assert!(resolve_owner(Some("  ".into()), &dir.path().join("o.txt")).is_err());
    }
}
