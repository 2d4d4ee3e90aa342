//! Start/stop operations for recording, playback and timedemo.

use crate::session::{DemoMode, DemoSink, Playback, Recording, SessionState};
use crate::settings::DemoSettings;
use crate::timing::{BenchmarkClock, BenchmarkReport};
use demoreel_core::{ClientHost, ConnectionState};
use demoreel_net::{DemoOpenError, DemoReader, DemoWriter, FrameError, NO_FORCED_TRACK};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// User-facing failures of demo operations.
///
/// None of these change the session state; the `Display` text is what the
/// console shows.
#[derive(Debug, Error)]
pub enum DemoError {
    /// `stop` without an active recording.
    #[error("Not recording a demo.")]
    NotRecording,
    /// `record` while already recording.
    #[error("Already recording a demo.")]
    AlreadyRecording,
    /// `play` or `timedemo` while a demo is already playing.
    #[error("Already playing a demo.")]
    AlreadyPlaying,
    /// `record` while a demo is playing.
    #[error("Can not record during demo playback.")]
    PlaybackActive,
    /// A demo name that walks up the directory tree.
    #[error("Relative pathnames are not allowed.")]
    RelativePath,
    /// `record` without a map while connected to a server.
    #[error(
        "Can not record - already connected to server\n\
         Client demo recording must be started before connecting"
    )]
    AlreadyConnected,
    /// The demo file could not be created.
    #[error("ERROR: couldn't create {}: {source}", .path.display())]
    Create {
        /// Resolved demo path.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
    /// The demo file could not be opened or its header is bad.
    #[error("ERROR: couldn't open {}: {source}", .path.display())]
    Open {
        /// Resolved demo path.
        path: PathBuf,
        /// Underlying failure.
        source: DemoOpenError,
    },
    /// Writing to the recording failed; the recording has been closed.
    #[error("ERROR: demo write to {} failed: {source}", .path.display())]
    Write {
        /// Resolved demo path.
        path: PathBuf,
        /// Underlying failure.
        source: FrameError,
    },
}

/// Owns the demo session and exposes the record/play/timedemo operations.
#[derive(Debug, Default)]
pub struct DemoController {
    settings: DemoSettings,
    pub(crate) session: SessionState,
}

impl DemoController {
    /// Create an idle controller.
    pub fn new(settings: DemoSettings) -> Self {
        Self {
            settings,
            session: SessionState::default(),
        }
    }

    /// Current session state.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Mutable session state, for the attract-loop driver.
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Settings used to resolve demo names.
    pub fn settings(&self) -> &DemoSettings {
        &self.settings
    }

    /// Begin recording live messages to `name`.
    ///
    /// With a `map`, the host is asked to load it first; without one, the
    /// client must not already be connected. `track` is stored in the header
    /// (`-1` when absent).
    pub fn start_recording<H: ClientHost + ?Sized>(
        &mut self,
        host: &mut H,
        name: &str,
        map: Option<&str>,
        track: Option<i32>,
    ) -> Result<PathBuf, DemoError> {
        if self.session.is_recording() {
            return Err(DemoError::AlreadyRecording);
        }
        if self.session.is_playing() {
            return Err(DemoError::PlaybackActive);
        }
        if !DemoSettings::is_contained(name) {
            return Err(DemoError::RelativePath);
        }
        if map.is_none() && host.connection_state().is_connected() {
            return Err(DemoError::AlreadyConnected);
        }

        let forced_track = match track {
            Some(track) => {
                host.print(&format!("Forcing CD track to {track}"));
                track
            }
            None => NO_FORCED_TRACK,
        };

        let path = self.settings.resolve(name);

        if let Some(map) = map {
            host.execute(&format!("map {map}"));
        }

        host.print(&format!("recording to {}.", path.display()));
        let writer = File::create(&path)
            .and_then(|file| {
                let sink: DemoSink = Box::new(BufWriter::new(file));
                DemoWriter::new(sink, forced_track)
            })
            .map_err(|source| DemoError::Create {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), forced_track, "Demo recording started");
        self.session.mode = DemoMode::Recording(Recording {
            path: path.clone(),
            writer,
        });
        Ok(path)
    }

    /// Close the current recording with a disconnect frame.
    pub fn stop_recording<H: ClientHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Result<PathBuf, DemoError> {
        let recording = match self.session.take_mode() {
            DemoMode::Recording(recording) => recording,
            other => {
                self.session.mode = other;
                return Err(DemoError::NotRecording);
            }
        };

        let Recording { path, writer } = recording;
        let frames = writer.frames_written();
        writer
            .finish(host.view_angles())
            .map_err(|source| DemoError::Write {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), frames, "Demo recording completed");
        host.print("Completed demo");
        Ok(path)
    }

    /// Start playing `name`.
    ///
    /// The file and its header are checked before anything else changes; a
    /// failure also clears the attract loop so no further demo is queued.
    /// Any live session or recording is shut down before playback begins.
    pub fn start_playback<H: ClientHost + ?Sized>(
        &mut self,
        host: &mut H,
        name: &str,
    ) -> Result<PathBuf, DemoError> {
        if self.session.is_playing() {
            return Err(DemoError::AlreadyPlaying);
        }

        let path = self.settings.resolve(name);
        host.print(&format!("Playing demo from {}.", path.display()));

        let reader = match DemoReader::open(&path, self.settings.max_header_len) {
            Ok(reader) => reader,
            Err(source) => {
                self.session.set_demo_loop(None);
                return Err(DemoError::Open { path, source });
            }
        };

        self.disconnect(host);

        info!(
            path = %path.display(),
            forced_track = reader.forced_track(),
            "Demo playback started"
        );
        host.set_connection_state(ConnectionState::Connected);
        self.session.reset_view_history();
        self.session.mode = DemoMode::Playing(Playback {
            path: path.clone(),
            reader,
        });
        Ok(path)
    }

    /// Start a timedemo of `name`: playback paced one frame per host frame.
    pub fn start_benchmark<H: ClientHost + ?Sized>(
        &mut self,
        host: &mut H,
        name: &str,
    ) -> Result<PathBuf, DemoError> {
        let path = self.start_playback(host, name)?;

        // The start time is re-taken on the second frame so loading isn't counted.
        let clock = BenchmarkClock::start(host.host_frame(), host.realtime());
        self.session.mode = match self.session.take_mode() {
            DemoMode::Playing(playback) => DemoMode::Benchmarking(playback, clock),
            other => other,
        };
        Ok(path)
    }

    /// End a running timedemo and report its result.
    ///
    /// Playback itself keeps going; [`DemoController::stop_playback`] calls
    /// this before closing the file.
    pub fn finish_benchmark<H: ClientHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Option<BenchmarkReport> {
        let (playback, clock) = match self.session.take_mode() {
            DemoMode::Benchmarking(playback, clock) => (playback, clock),
            other => {
                self.session.mode = other;
                return None;
            }
        };
        self.session.mode = DemoMode::Playing(playback);

        let report = clock.finish(host.host_frame(), host.realtime());
        info!(
            frames = report.frames,
            seconds = report.seconds,
            fps = report.fps,
            "Timedemo finished"
        );
        host.print(&report.to_string());
        Some(report)
    }

    /// Close the playing demo. Returns the timedemo report if one was running.
    pub fn stop_playback<H: ClientHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Option<BenchmarkReport> {
        if !self.session.is_playing() {
            return None;
        }

        let report = self.finish_benchmark(host);
        if let DemoMode::Playing(playback) = self.session.take_mode() {
            info!(
                path = %playback.path.display(),
                frames = playback.reader.frames_read(),
                "Demo playback stopped"
            );
        }
        host.set_connection_state(ConnectionState::Disconnected);
        report
    }

    /// Drop the session: stop playback or recording, then the live connection.
    pub fn disconnect<H: ClientHost + ?Sized>(&mut self, host: &mut H) -> Option<BenchmarkReport> {
        let report = self.stop_playback(host);
        if self.session.is_recording() {
            if let Err(err) = self.stop_recording(host) {
                warn!("Failed to finish demo on disconnect: {}", err);
                host.print(&err.to_string());
            }
        }
        host.disconnect_live();
        host.set_connection_state(ConnectionState::Disconnected);
        report
    }
}
