//! Offline demo inspection.

use crate::codec::FrameError;
use crate::demo::DemoReader;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Statistics gathered by scanning a whole demo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoSummary {
    /// Track number from the header (`-1` when none is forced).
    pub forced_track: i32,
    /// Number of readable frames.
    pub frames: u64,
    /// Sum of all payload lengths.
    pub payload_bytes: u64,
    /// Longest payload seen.
    pub largest_frame: usize,
    /// Frames holding a lone keepalive byte.
    pub keepalives: u64,
    /// CRC32 over every payload in order.
    pub crc32: u32,
    /// Whether the final frame is the disconnect marker a recorder writes on stop.
    pub ends_with_disconnect: bool,
}

impl DemoSummary {
    /// Scan every frame of `reader`.
    ///
    /// Unlike playback, a corrupt length prefix is returned as an error so the
    /// caller can report on the file.
    pub fn scan<R: Read>(mut reader: DemoReader<R>) -> Result<Self, FrameError> {
        let mut hasher = crc32fast::Hasher::new();
        let mut summary = Self {
            forced_track: reader.forced_track(),
            frames: 0,
            payload_bytes: 0,
            largest_frame: 0,
            keepalives: 0,
            crc32: 0,
            ends_with_disconnect: false,
        };

        while let Some(frame) = reader.next_frame()? {
            let payload = frame.message.as_bytes();
            hasher.update(payload);
            summary.frames += 1;
            summary.payload_bytes += payload.len() as u64;
            summary.largest_frame = summary.largest_frame.max(payload.len());
            if frame.message.is_keepalive() {
                summary.keepalives += 1;
            }
            summary.ends_with_disconnect = frame.message.is_disconnect();
        }

        summary.crc32 = hasher.finalize();
        Ok(summary)
    }

    /// Open and scan the demo at `path`.
    pub fn scan_path(path: impl AsRef<Path>, max_header_len: usize) -> Result<Self> {
        let path = path.as_ref();
        let reader = DemoReader::open(path, max_header_len)
            .with_context(|| format!("Failed to open demo: {:?}", path))?;
        Self::scan(reader).with_context(|| format!("Failed to scan demo: {:?}", path))
    }
}
