#![warn(missing_docs)]
//! Test doubles and fixtures for the demo subsystem.

mod host;
mod transport;

use anyhow::{Context, Result};
use demoreel_core::ViewAngles;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use host::ManualHost;
pub use transport::ScriptedTransport;

/// Encode a demo by hand: header line, then one frame per entry.
///
/// Written independently of the codec so tests can check it byte for byte.
/// No disconnect frame is appended.
pub fn demo_bytes(forced_track: i32, frames: &[(&[u8], ViewAngles)]) -> Vec<u8> {
    let mut bytes = format!("{forced_track}\n").into_bytes();
    for (payload, angles) in frames {
        bytes.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        for angle in angles.to_array() {
            bytes.extend_from_slice(&angle.to_le_bytes());
        }
        bytes.extend_from_slice(payload);
    }
    bytes
}

/// Write [`demo_bytes`] to `dir/name`, creating `dir` if needed.
pub fn write_demo(
    dir: impl AsRef<Path>,
    name: &str,
    forced_track: i32,
    frames: &[(&[u8], ViewAngles)],
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, demo_bytes(forced_track, frames))
        .with_context(|| format!("Failed to write demo {}", path.display()))?;
    Ok(path)
}

/// One captured host event.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Host frame when the transcript was taken.
    pub host_frame: u64,
    /// `"print"` or `"execute"`.
    pub kind: &'a str,
    /// The console line or command.
    pub payload: &'a str,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }

    /// Append everything `host` printed and executed.
    pub fn write_transcript(&mut self, host: &ManualHost) -> Result<()> {
        for line in &host.console {
            self.write(&EventRecord {
                host_frame: host.host_frame,
                kind: "print",
                payload: line,
            })?;
        }
        for command in &host.executed {
            self.write(&EventRecord {
                host_frame: host.host_frame,
                kind: "execute",
                payload: command,
            })?;
        }
        Ok(())
    }
}
