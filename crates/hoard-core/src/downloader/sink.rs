//! Body sink for one transfer attempt: status check, size gate, chunked write.

use std::time::Instant;

use crate::retry::FetchError;
use crate::storage::{PartialWriter, TransferState};
use crate::transport::{BodySink, ResponseHead};

use super::DownloadOptions;

pub(super) struct TransferSink<'a> {
    state: &'a TransferState,
    options: &'a DownloadOptions,
    writer: Option<PartialWriter>,
    declared: u64,
    offset: u64,
    last_progress: Instant,
}

impl<'a> TransferSink<'a> {
    pub(super) fn new(state: &'a TransferState, options: &'a DownloadOptions) -> Self {
        Self {
            state,
            options,
            writer: None,
            declared: 0,
            offset: 0,
            last_progress: Instant::now(),
        }
    }

    /// Writer, declared total and starting offset of a transfer that reached its end.
    pub(super) fn finish(self) -> Result<(PartialWriter, u64, u64), FetchError> {
        let writer = self
            .writer
            .ok_or_else(|| FetchError::malformed("transfer ended without a response head"))?;
        Ok((writer, self.declared, self.offset))
    }

    fn log_progress(&mut self, written: u64) {
        if self.last_progress.elapsed() < self.options.progress_interval {
            return;
        }
        self.last_progress = Instant::now();
        let pct = if self.declared > 0 {
            written as f64 / self.declared as f64 * 100.0
        } else {
            0.0
        };
        tracing::debug!(
            path = %self.state.destination.display(),
            written,
            total = self.declared,
            "transfer progress {:.1}%",
            pct
        );
    }
}

impl BodySink for TransferSink<'_> {
    fn on_head(&mut self, head: &ResponseHead) -> Result<(), FetchError> {
        let offset = match head.status {
            206 => {
                let expected = self.state.resume_offset;
                match head.range_start {
                    Some(start) if start != expected => {
                        // Appending this body would splice the wrong bytes onto the partial file.
                        self.state.discard()?;
                        return Err(FetchError::malformed(format!(
                            "range starts at {} but partial file holds {} bytes",
                            start, expected
                        )));
                    }
                    _ => expected,
                }
            }
            200 => {
                if self.state.is_resume() {
                    tracing::warn!(
                        path = %self.state.destination.display(),
                        "remote ignored range request, restarting from zero"
                    );
                }
                0
            }
            416 if self.state.is_resume() => {
                // Our partial file does not fit the remote payload any more.
                self.state.discard()?;
                return Err(FetchError::Http(416));
            }
            code => return Err(FetchError::Http(code)),
        };

        let remaining = match (head.content_length, head.range_total) {
            (Some(len), _) => len,
            (None, Some(total)) => total.saturating_sub(offset),
            (None, None) => return Err(FetchError::malformed("response has no length")),
        };
        let declared = offset + remaining;
        if declared < self.options.min_payload_bytes {
            return Err(FetchError::malformed(format!(
                "declared size {} below minimum {}, likely an error response",
                declared, self.options.min_payload_bytes
            )));
        }

        let writer = if offset > 0 {
            PartialWriter::append(&self.state.temp_path)?
        } else {
            PartialWriter::create(&self.state.temp_path)?
        };
        if writer.bytes_written() != offset {
            return Err(FetchError::malformed(format!(
                "partial file changed under us: expected {} bytes, found {}",
                offset,
                writer.bytes_written()
            )));
        }

        self.offset = offset;
        self.declared = declared;
        self.writer = Some(writer);
        Ok(())
    }

    fn on_chunk(&mut self, data: &[u8]) -> Result<(), FetchError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| FetchError::malformed("body chunk before response head"))?;
        writer.write_chunk(data)?;
        let written = writer.bytes_written();
        self.log_progress(written);
        Ok(())
    }
}
