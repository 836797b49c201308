//! Integrity probes for small files found at the destination.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Decides whether an existing file below the size threshold is still a usable payload.
pub trait PayloadProbe: Send + Sync {
    fn is_valid(&self, path: &Path) -> bool;
}

/// Accepts an ISO base media file (MP4/M4S/MOV family): the first box is `ftyp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoMediaProbe;

impl PayloadProbe for IsoMediaProbe {
    fn is_valid(&self, path: &Path) -> bool {
        let mut header = [0u8; 8];
        let read = File::open(path).and_then(|mut f| f.read_exact(&mut header));
        if read.is_err() {
            return false;
        }
        let box_len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        &header[4..8] == b"ftyp" && box_len >= 8
    }
}

/// Treats any existing file as complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PayloadProbe for AcceptAll {
    fn is_valid(&self, _path: &Path) -> bool {
        true
    }
}
