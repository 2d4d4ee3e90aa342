//! Playback pacing.
//!
//! Normal playback follows simulation time: a new frame is read only once
//! the client clock has passed the last message's time marker. Timedemo
//! follows host frames instead, reading exactly one demo frame per rendered
//! frame so the run measures raw throughput.

use demoreel_core::ClientHost;
use serde::Serialize;
use std::fmt;

/// Whether the message source may read another demo frame this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Read the next frame.
    Fetch,
    /// Keep using the last message.
    Hold,
}

/// Frame counters for a timedemo run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkClock {
    start_frame: u64,
    last_frame: Option<u64>,
    start_time: f64,
}

impl BenchmarkClock {
    /// Start counting at `host_frame`.
    ///
    /// `realtime` is only a fallback start time; the real one is taken on the
    /// second counted frame so load time is excluded.
    pub fn start(host_frame: u64, realtime: f64) -> Self {
        Self {
            start_frame: host_frame,
            last_frame: None,
            start_time: realtime,
        }
    }

    /// Admit at most one fetch per host frame.
    pub fn admit(&mut self, host_frame: u64, realtime: f64) -> GateDecision {
        if self.last_frame == Some(host_frame) {
            return GateDecision::Hold;
        }
        self.last_frame = Some(host_frame);

        // The first frame carries the load time; start the stopwatch on the second.
        if host_frame == self.start_frame + 1 {
            self.start_time = realtime;
        }
        GateDecision::Fetch
    }

    /// Host frame the run started on.
    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// Host frame of the most recent fetch.
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Wall-clock time the measurement started at.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Summarize the run as of `host_frame` and `realtime`.
    pub fn finish(&self, host_frame: u64, realtime: f64) -> BenchmarkReport {
        // The first frame didn't count.
        let frames = host_frame
            .saturating_sub(self.start_frame)
            .saturating_sub(1);
        let mut seconds = realtime - self.start_time;
        if seconds == 0.0 {
            seconds = 1.0;
        }
        BenchmarkReport {
            frames,
            seconds,
            fps: frames as f64 / seconds,
        }
    }
}

/// Result of a timedemo run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BenchmarkReport {
    /// Frames rendered, excluding the warm-up frame.
    pub frames: u64,
    /// Wall-clock seconds measured.
    pub seconds: f64,
    /// Average frames per second.
    pub fps: f64,
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames {:5.1} seconds {:5.1} fps",
            self.frames, self.seconds, self.fps
        )
    }
}

/// Decide whether playback should read a new frame this tick.
///
/// Until signon completes every tick fetches, so connection setup messages
/// are never delayed.
pub fn playback_gate<H: ClientHost + ?Sized>(
    benchmark: Option<&mut BenchmarkClock>,
    host: &H,
) -> GateDecision {
    if !host.signon_complete() {
        return GateDecision::Fetch;
    }

    match benchmark {
        Some(clock) => clock.admit(host.host_frame(), host.realtime()),
        None if host.sim_time() <= host.message_time() => GateDecision::Hold,
        None => GateDecision::Fetch,
    }
}
