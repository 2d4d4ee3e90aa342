//! File-backed demo recorder and player.

use crate::codec::{
    read_frame, read_header, write_frame, write_header, DemoFrame, FrameError, HeaderError,
};
use demoreel_core::{NetMessage, ViewAngles};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Reasons a demo could not be opened for playback.
#[derive(Debug, Error)]
pub enum DemoOpenError {
    /// The file could not be opened.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The header line is missing or malformed.
    #[error(transparent)]
    Header(#[from] HeaderError),
}

/// Appends frames to a demo.
///
/// The header is written on construction. Every frame is flushed as soon as it
/// is written, so a crash loses at most the frame in flight.
pub struct DemoWriter<W: Write> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> DemoWriter<W> {
    /// Start a demo on an arbitrary sink.
    pub fn new(mut writer: W, forced_track: i32) -> io::Result<Self> {
        write_header(&mut writer, forced_track)?;
        Ok(Self {
            writer,
            frames_written: 0,
        })
    }

    /// Record one delivered message with the view angles current at delivery.
    pub fn write_message(
        &mut self,
        message: &NetMessage,
        view_angles: ViewAngles,
    ) -> Result<(), FrameError> {
        write_frame(&mut self.writer, message.as_bytes(), view_angles)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write the closing disconnect frame and hand back the sink.
    pub fn finish(mut self, view_angles: ViewAngles) -> Result<W, FrameError> {
        self.write_message(&NetMessage::disconnect(), view_angles)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Give up on the demo without a closing frame.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Frames written so far, excluding the closing disconnect frame.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

/// Reads frames back from a demo.
pub struct DemoReader<R: Read = BufReader<File>> {
    reader: R,
    forced_track: i32,
    frames_read: u64,
}

impl DemoReader {
    /// Open the demo at `path` and consume its header.
    pub fn open(path: impl AsRef<Path>, max_header_len: usize) -> Result<Self, DemoOpenError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file), max_header_len)?)
    }
}

impl<R: Read> DemoReader<R> {
    /// Consume the header from `reader`.
    pub fn new(mut reader: R, max_header_len: usize) -> Result<Self, HeaderError> {
        let forced_track = read_header(&mut reader, max_header_len)?;
        Ok(Self {
            reader,
            forced_track,
            frames_read: 0,
        })
    }

    /// Next frame, or `Ok(None)` once the demo is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<DemoFrame>, FrameError> {
        let frame = read_frame(&mut self.reader)?;
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }

    /// Track number from the header.
    pub fn forced_track(&self) -> i32 {
        self.forced_track
    }

    /// Frames returned so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}
