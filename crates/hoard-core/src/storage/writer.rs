//! Sequential writer for the temp file of one transfer.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Appends chunks to the temp file and tracks how many bytes it holds.
///
/// `bytes_written` always equals the temp file's length: every chunk is
/// written in full before the counter moves.
pub struct PartialWriter {
    file: File,
    temp_path: PathBuf,
    bytes_written: u64,
}

impl PartialWriter {
    /// Create (or truncate) the temp file and start from offset 0.
    pub fn create(temp_path: &Path) -> std::io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(PartialWriter {
            file,
            temp_path: temp_path.to_path_buf(),
            bytes_written: 0,
        })
    }

    /// Open an existing temp file for append. Starts counting from its current length.
    pub fn append(temp_path: &Path) -> std::io::Result<Self> {
        let file = File::options().append(true).open(temp_path)?;
        let bytes_written = file.metadata()?.len();
        Ok(PartialWriter {
            file,
            temp_path: temp_path.to_path_buf(),
            bytes_written,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.file.write_all(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> std::io::Result<()> {
        self.file.sync_all()
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Replace `final_path` with the temp file via rename. Any stale file at
    /// `final_path` is removed first. Consumes the writer and closes the file.
    /// Fails if `final_path` is on a different filesystem.
    pub fn finalize(self, final_path: &Path) -> std::io::Result<()> {
        let temp_path = self.temp_path.clone();
        drop(self.file);

        match std::fs::remove_file(final_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        std::fs::rename(&temp_path, final_path)
    }
}
