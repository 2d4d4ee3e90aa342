//! The client's per-tick message source: a playing demo or the live transport.

use crate::controller::{DemoController, DemoError};
use crate::session::DemoMode;
use crate::timing::{playback_gate, BenchmarkReport, GateDecision};
use demoreel_core::{ClientHost, NetMessage};
use demoreel_net::{FrameError, Transport};
use std::path::Path;
use tracing::{debug, error, warn};

/// Outcome of one [`DemoController::get_next_message`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum NextMessage {
    /// A message for the parser.
    Delivered(NetMessage),
    /// Nothing this tick: the transport is idle or playback is waiting.
    Pending,
    /// The demo ran out and playback stopped. Carries the timedemo result,
    /// if one was running.
    Ended(Option<BenchmarkReport>),
}

impl NextMessage {
    /// The delivered message, if any.
    pub fn message(&self) -> Option<&NetMessage> {
        match self {
            Self::Delivered(message) => Some(message),
            _ => None,
        }
    }
}

impl DemoController {
    /// Fetch the next server message.
    ///
    /// While a demo plays, frames come from the file paced by the playback
    /// gate and `transport` is not touched. Otherwise the transport is polled
    /// and, while recording, every received message is appended to the demo
    /// with the host's current view angles.
    ///
    /// # Panics
    ///
    /// A playing demo with a frame length outside `0..=MAX_MSGLEN` is corrupt
    /// beyond recovery; this aborts with a fatal error.
    pub fn get_next_message<H, T>(&mut self, host: &mut H, transport: &mut T) -> NextMessage
    where
        H: ClientHost + ?Sized,
        T: Transport + ?Sized,
    {
        if self.session.is_playing() {
            self.next_from_demo(host)
        } else {
            self.next_from_transport(host, transport)
        }
    }

    fn next_from_demo<H: ClientHost + ?Sized>(&mut self, host: &mut H) -> NextMessage {
        let (playback, clock) = match &mut self.session.mode {
            DemoMode::Playing(playback) => (playback, None),
            DemoMode::Benchmarking(playback, clock) => (playback, Some(clock)),
            _ => return NextMessage::Pending,
        };

        if playback_gate(clock, &*host) == GateDecision::Hold {
            return NextMessage::Pending;
        }

        match playback.reader.next_frame() {
            Ok(Some(frame)) => {
                self.session.push_view_angles(frame.view_angles);
                NextMessage::Delivered(frame.message)
            }
            Ok(None) => {
                debug!("End of demo reached");
                NextMessage::Ended(self.stop_playback(host))
            }
            Err(err) if err.is_fatal() => fatal(&playback.path, &err),
            Err(err) => {
                warn!(path = %playback.path.display(), "Demo read failed: {}", err);
                NextMessage::Ended(self.stop_playback(host))
            }
        }
    }

    fn next_from_transport<H, T>(&mut self, host: &mut H, transport: &mut T) -> NextMessage
    where
        H: ClientHost + ?Sized,
        T: Transport + ?Sized,
    {
        let message = match transport.try_recv() {
            Ok(Some(message)) => message,
            Ok(None) => return NextMessage::Pending,
            Err(err) => {
                warn!("Transport receive failed: {}", err);
                return NextMessage::Pending;
            }
        };

        if message.is_keepalive() {
            debug!("<-- server to client keepalive");
        }

        if let DemoMode::Recording(recording) = &mut self.session.mode {
            if let Err(source) = recording.writer.write_message(&message, host.view_angles()) {
                let path = recording.path.clone();
                // Dropping the writer closes the file; frames already written stay valid.
                self.session.mode = DemoMode::Idle;
                let err = DemoError::Write { path, source };
                error!("Demo recording stopped: {}", err);
                host.print(&err.to_string());
            }
        }

        NextMessage::Delivered(message)
    }
}

fn fatal(path: &Path, err: &FrameError) -> ! {
    error!(path = %path.display(), "Corrupt demo: {}", err);
    panic!("corrupt demo {}: {}", path.display(), err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{DemoSink, ModeKind, Recording};
    use crate::settings::DemoSettings;
    use demoreel_core::{ViewAngles, SVC_NOP};
    use demoreel_net::DemoWriter;
    use demoreel_testkit::{demo_bytes, ManualHost, ScriptedTransport};
    use std::fs;
    use std::io::{self, Write};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn msg(bytes: &[u8]) -> NetMessage {
        NetMessage::from_slice(bytes).unwrap()
    }

    #[test]
    fn idle_passes_transport_through() {
        let mut controller = DemoController::default();
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::new([msg(&[9, 9])]);

        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Delivered(msg(&[9, 9]))
        );
        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Pending
        );
    }

    #[test]
    fn transport_errors_read_as_no_message() {
        let mut controller = DemoController::default();
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::default();
        transport.push_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));

        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Pending
        );
    }

    #[test]
    fn recording_appends_messages_with_current_angles() {
        let dir = tempdir().unwrap();
        let mut controller = DemoController::new(DemoSettings::with_game_dir(dir.path()));
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::new([msg(&[5, 6]), msg(&[SVC_NOP])]);

        let path = controller
            .start_recording(&mut host, "rec", None, None)
            .unwrap();
        host.view_angles = ViewAngles::new(1.0, 2.0, 3.0);
        controller.get_next_message(&mut host, &mut transport);
        host.view_angles = ViewAngles::new(4.0, 5.0, 6.0);
        let keepalive = controller.get_next_message(&mut host, &mut transport);
        assert!(keepalive.message().unwrap().is_keepalive());
        assert_eq!(controller.session().frames(), 2);

        controller.stop_recording(&mut host).unwrap();
        assert_eq!(
            fs::read(path).unwrap(),
            demo_bytes(
                -1,
                &[
                    (&[5, 6][..], ViewAngles::new(1.0, 2.0, 3.0)),
                    (&[SVC_NOP][..], ViewAngles::new(4.0, 5.0, 6.0)),
                    (&[2][..], ViewAngles::new(4.0, 5.0, 6.0)),
                ]
            )
        );
    }

    #[test]
    fn playback_ignores_transport_and_tracks_angles() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("p.dem"),
            demo_bytes(
                -1,
                &[
                    (&[1, 1][..], ViewAngles::new(10.0, 0.0, 0.0)),
                    (&[2, 2][..], ViewAngles::new(20.0, 0.0, 0.0)),
                ],
            ),
        )
        .unwrap();
        let mut controller = DemoController::new(DemoSettings::with_game_dir(dir.path()));
        let mut host = ManualHost::new();
        host.signon_complete = false;
        let mut transport = ScriptedTransport::new([msg(&[77])]);

        controller.start_playback(&mut host, "p").unwrap();

        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Delivered(msg(&[1, 1]))
        );
        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Delivered(msg(&[2, 2]))
        );
        assert_eq!(
            controller.session().view_history(),
            [ViewAngles::new(20.0, 0.0, 0.0), ViewAngles::new(10.0, 0.0, 0.0)]
        );
        assert_eq!(transport.remaining(), 1);

        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Ended(None)
        );
        assert_eq!(controller.session().mode(), ModeKind::Idle);
    }

    #[test]
    fn playback_holds_until_sim_time_passes_message_time() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("p.dem"),
            demo_bytes(-1, &[(&[1][..], ViewAngles::ZERO), (&[2][..], ViewAngles::ZERO)]),
        )
        .unwrap();
        let mut controller = DemoController::new(DemoSettings::with_game_dir(dir.path()));
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::default();
        controller.start_playback(&mut host, "p").unwrap();

        host.sim_time = 0.5;
        host.message_time = 0.5;
        for _ in 0..3 {
            assert_eq!(
                controller.get_next_message(&mut host, &mut transport),
                NextMessage::Pending
            );
        }
        assert_eq!(controller.session().frames(), 0);

        host.sim_time = 0.6;
        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Delivered(msg(&[1]))
        );
    }

    #[test]
    fn timedemo_reads_one_frame_per_host_frame() {
        let dir = tempdir().unwrap();
        let frames: Vec<(&[u8], ViewAngles)> = vec![(&[1u8][..], ViewAngles::ZERO); 4];
        fs::write(dir.path().join("td.dem"), demo_bytes(-1, &frames)).unwrap();
        let mut controller = DemoController::new(DemoSettings::with_game_dir(dir.path()));
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::default();
        host.host_frame = 100;
        controller.start_benchmark(&mut host, "td").unwrap();

        let mut delivered = 0;
        let report = loop {
            host.host_frame += 1;
            host.realtime += 0.25;
            match controller.get_next_message(&mut host, &mut transport) {
                NextMessage::Delivered(_) => delivered += 1,
                NextMessage::Pending => panic!("timedemo never waits on a new frame"),
                NextMessage::Ended(report) => break report.expect("timedemo report"),
            }
            assert_eq!(
                controller.get_next_message(&mut host, &mut transport),
                NextMessage::Pending
            );
        };

        assert_eq!(delivered, 4);
        assert_eq!(report.frames, 4);
        assert!((report.seconds - 1.0).abs() < 1e-9);
        assert!((report.fps - 4.0).abs() < 1e-9);
    }

    #[test]
    fn truncated_payload_ends_playback() {
        let dir = tempdir().unwrap();
        let mut bytes = demo_bytes(-1, &[(&[1, 2, 3, 4][..], ViewAngles::ZERO)]);
        bytes.truncate(bytes.len() - 2);
        fs::write(dir.path().join("cut.dem"), bytes).unwrap();
        let mut controller = DemoController::new(DemoSettings::with_game_dir(dir.path()));
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::default();
        controller.start_playback(&mut host, "cut").unwrap();

        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Ended(None)
        );
        assert!(!host.connection.is_connected());
    }

    #[test]
    #[should_panic(expected = "corrupt demo")]
    fn oversized_frame_is_fatal() {
        let dir = tempdir().unwrap();
        let mut bytes = b"-1\n".to_vec();
        bytes.extend_from_slice(&8001i32.to_le_bytes());
        bytes.extend_from_slice(&[0; 12]);
        fs::write(dir.path().join("bad.dem"), bytes).unwrap();
        let mut controller = DemoController::new(DemoSettings::with_game_dir(dir.path()));
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::default();
        controller.start_playback(&mut host, "bad").unwrap();

        controller.get_next_message(&mut host, &mut transport);
    }

    #[test]
    #[should_panic(expected = "corrupt demo")]
    fn oversized_length_without_angles_is_fatal() {
        let dir = tempdir().unwrap();
        let mut bytes = b"-1\n".to_vec();
        bytes.extend_from_slice(&9000i32.to_le_bytes());
        fs::write(dir.path().join("short.dem"), bytes).unwrap();
        let mut controller = DemoController::new(DemoSettings::with_game_dir(dir.path()));
        let mut host = ManualHost::new();
        let mut transport = ScriptedTransport::default();
        controller.start_playback(&mut host, "short").unwrap();
        host.signon_complete = false;

        controller.get_next_message(&mut host, &mut transport);
    }

    /// Accepts `room` bytes, then fails every write.
    struct FullDisk {
        room: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn record_write_failure_delivers_and_stops_recording() {
        let mut controller = DemoController::default();
        let mut host = ManualHost::new();
        let sink: DemoSink = Box::new(FullDisk { room: 3 });
        controller.session.mode = DemoMode::Recording(Recording {
            path: PathBuf::from("full.dem"),
            writer: DemoWriter::new(sink, -1).unwrap(),
        });
        let mut transport = ScriptedTransport::new([msg(&[7, 7]), msg(&[8])]);

        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Delivered(msg(&[7, 7]))
        );
        assert_eq!(controller.session().mode(), ModeKind::Idle);
        assert!(host
            .console
            .iter()
            .any(|line| line.starts_with("ERROR: demo write to full.dem failed")));

        assert_eq!(
            controller.get_next_message(&mut host, &mut transport),
            NextMessage::Delivered(msg(&[8]))
        );
        assert_eq!(host.console.len(), 1);
    }
}
