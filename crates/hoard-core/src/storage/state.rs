//! Resumption state read back from disk before every attempt.

use std::io;
use std::path::{Path, PathBuf};

use super::temp_path;

/// What is on disk for one destination right now.
///
/// Built fresh by [`TransferState::inspect`] at the start of each attempt so a
/// retried transfer always resumes from what was actually written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferState {
    pub destination: PathBuf,
    pub temp_path: PathBuf,
    /// Bytes already in the temp file (0 if it does not exist).
    pub resume_offset: u64,
}

impl TransferState {
    pub fn inspect(destination: &Path) -> io::Result<Self> {
        let temp_path = temp_path(destination);
        let resume_offset = match std::fs::metadata(&temp_path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e),
        };
        Ok(Self {
            destination: destination.to_path_buf(),
            temp_path,
            resume_offset,
        })
    }

    pub fn is_resume(&self) -> bool {
        self.resume_offset > 0
    }

    /// Remove the temp file, if any. Used when partial progress cannot be trusted.
    pub fn discard(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.temp_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
