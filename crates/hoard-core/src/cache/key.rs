use std::fmt;
use std::path::{Path, PathBuf};

/// Directory + resource name; maps to exactly one file under the cache root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    dir: PathBuf,
    name: String,
}

impl CacheKey {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// `"item-7/comments"` → dir `item-7`, name `comments`. No slash → top-level.
impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        match s.rsplit_once('/') {
            Some((dir, name)) => CacheKey::new(dir, name),
            None => CacheKey::new("", s),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}
