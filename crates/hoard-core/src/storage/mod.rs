//! Disk side of a resumable transfer.
//!
//! A payload is streamed into `<destination>.tmp`, appended to when resuming,
//! and only reaches `<destination>` through an atomic rename once verified.

mod state;
mod writer;

pub use state::TransferState;
pub use writer::PartialWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Path for the temp file: appends `.tmp` to the final path (e.g. `video.mp4` → `video.mp4.tmp`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn temp_path_appends_suffix() {
        let p = temp_path(Path::new("video.mp4"));
        assert_eq!(p.to_string_lossy(), "video.mp4.tmp");
        let p2 = temp_path(Path::new("/data/7/video.mp4"));
        assert_eq!(p2.to_string_lossy(), "/data/7/video.mp4.tmp");
    }
}
