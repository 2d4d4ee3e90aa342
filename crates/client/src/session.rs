//! Per-session demo state.

use crate::timing::BenchmarkClock;
use demoreel_core::ViewAngles;
use demoreel_net::{DemoReader, DemoWriter, NO_FORCED_TRACK};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination of a recording.
pub(crate) type DemoSink = Box<dyn Write>;

/// An open recording.
pub struct Recording {
    pub(crate) path: PathBuf,
    pub(crate) writer: DemoWriter<DemoSink>,
}

/// An open playback.
pub struct Playback {
    pub(crate) path: PathBuf,
    pub(crate) reader: DemoReader,
}

impl Recording {
    /// File being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Playback {
    /// File being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What the demo subsystem is doing. The open file lives inside the variant,
/// so there is a file exactly when the mode is not `Idle`.
pub enum DemoMode {
    /// No demo activity.
    Idle,
    /// Live messages are being written to a demo.
    Recording(Recording),
    /// Messages come from a demo, paced by simulation time.
    Playing(Playback),
    /// Messages come from a demo, one per host frame, for a timedemo.
    Benchmarking(Playback, BenchmarkClock),
}

/// Field-less view of [`DemoMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    /// See [`DemoMode::Idle`].
    Idle,
    /// See [`DemoMode::Recording`].
    Recording,
    /// See [`DemoMode::Playing`].
    Playing,
    /// See [`DemoMode::Benchmarking`].
    Benchmarking,
}

impl DemoMode {
    /// Which variant this is.
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Idle => ModeKind::Idle,
            Self::Recording(_) => ModeKind::Recording,
            Self::Playing(_) => ModeKind::Playing,
            Self::Benchmarking(..) => ModeKind::Benchmarking,
        }
    }
}

impl fmt::Debug for DemoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Recording(rec) => f.debug_tuple("Recording").field(&rec.path).finish(),
            Self::Playing(play) => f.debug_tuple("Playing").field(&play.path).finish(),
            Self::Benchmarking(play, clock) => f
                .debug_tuple("Benchmarking")
                .field(&play.path)
                .field(clock)
                .finish(),
        }
    }
}

/// Session state owned by a single [`DemoController`](crate::DemoController).
#[derive(Debug)]
pub struct SessionState {
    pub(crate) mode: DemoMode,
    /// `[current, previous]` view angles from the last two demo frames.
    view_history: [ViewAngles; 2],
    demo_loop: Option<usize>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: DemoMode::Idle,
            view_history: [ViewAngles::ZERO; 2],
            demo_loop: None,
        }
    }
}

impl SessionState {
    /// Current mode.
    pub fn mode(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Whether live messages are being recorded.
    pub fn is_recording(&self) -> bool {
        matches!(self.mode, DemoMode::Recording(_))
    }

    /// Whether a demo is playing, timedemo included.
    pub fn is_playing(&self) -> bool {
        matches!(self.mode, DemoMode::Playing(_) | DemoMode::Benchmarking(..))
    }

    /// Whether a timedemo is running.
    pub fn is_benchmarking(&self) -> bool {
        matches!(self.mode, DemoMode::Benchmarking(..))
    }

    /// Track the playing demo asks for, if any.
    pub fn forced_track(&self) -> Option<i32> {
        match &self.mode {
            DemoMode::Playing(play) | DemoMode::Benchmarking(play, _) => {
                Some(play.reader.forced_track()).filter(|track| *track != NO_FORCED_TRACK)
            }
            _ => None,
        }
    }

    /// File behind the current recording or playback.
    pub fn demo_path(&self) -> Option<&Path> {
        match &self.mode {
            DemoMode::Idle => None,
            DemoMode::Recording(rec) => Some(&rec.path),
            DemoMode::Playing(play) | DemoMode::Benchmarking(play, _) => Some(&play.path),
        }
    }

    /// Frames written (recording) or read (playback) so far.
    pub fn frames(&self) -> u64 {
        match &self.mode {
            DemoMode::Idle => 0,
            DemoMode::Recording(rec) => rec.writer.frames_written(),
            DemoMode::Playing(play) | DemoMode::Benchmarking(play, _) => play.reader.frames_read(),
        }
    }

    /// Timedemo counters, while benchmarking.
    pub fn benchmark(&self) -> Option<&BenchmarkClock> {
        match &self.mode {
            DemoMode::Benchmarking(_, clock) => Some(clock),
            _ => None,
        }
    }

    /// `[current, previous]` view angles of the last two fetched frames.
    pub fn view_history(&self) -> [ViewAngles; 2] {
        self.view_history
    }

    /// Index of the next demo in the attract loop, if one is queued.
    pub fn demo_loop(&self) -> Option<usize> {
        self.demo_loop
    }

    /// Queue (or clear) the next demo in the attract loop.
    pub fn set_demo_loop(&mut self, index: Option<usize>) {
        self.demo_loop = index;
    }

    pub(crate) fn push_view_angles(&mut self, angles: ViewAngles) {
        self.view_history[1] = self.view_history[0];
        self.view_history[0] = angles;
    }

    pub(crate) fn reset_view_history(&mut self) {
        self.view_history = [ViewAngles::ZERO; 2];
    }

    pub(crate) fn take_mode(&mut self) -> DemoMode {
        std::mem::replace(&mut self.mode, DemoMode::Idle)
    }
}
