//! Renderer-less client loop driving the demo controller.

use crate::config::PlaybackSettings;
use anyhow::{bail, Context, Result};
use demoreel_client::{
    dispatch, BenchmarkReport, ClientHost, CommandSource, DemoController, NextMessage,
};
use demoreel_core::{ConnectionState, ViewAngles};
use demoreel_net::Transport;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Host with wall-clock time and no parser.
///
/// Without a parser there are no server time stamps, so each delivered
/// message moves the message clock forward by one `frame_interval`. Signon
/// completes with the first message of a connection.
pub struct HeadlessHost {
    started: Instant,
    host_frame: u64,
    sim_time: f64,
    message_time: f64,
    frame_interval: f64,
    signon_complete: bool,
    view_angles: ViewAngles,
    connection: ConnectionState,
}

impl HeadlessHost {
    pub fn new(settings: &PlaybackSettings) -> Self {
        Self {
            started: Instant::now(),
            host_frame: 0,
            sim_time: 0.0,
            message_time: 0.0,
            frame_interval: settings.frame_interval().as_secs_f64(),
            signon_complete: false,
            view_angles: ViewAngles::ZERO,
            connection: ConnectionState::Disconnected,
        }
    }

    /// Run one host frame of `dt` simulated seconds.
    pub fn advance(&mut self, dt: Duration) {
        self.host_frame += 1;
        self.sim_time += dt.as_secs_f64();
    }

    /// Account for a message handed to the (absent) parser.
    pub fn on_delivered(&mut self) {
        self.message_time = self.sim_time.max(self.message_time) + self.frame_interval;
        self.signon_complete = true;
    }
}

impl ClientHost for HeadlessHost {
    fn sim_time(&self) -> f64 {
        self.sim_time
    }

    fn message_time(&self) -> f64 {
        self.message_time
    }

    fn host_frame(&self) -> u64 {
        self.host_frame
    }

    fn realtime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn signon_complete(&self) -> bool {
        self.signon_complete
    }

    fn view_angles(&self) -> ViewAngles {
        self.view_angles
    }

    fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        if state != self.connection {
            debug!(?state, "Connection state changed");
        }
        if state.is_connected() {
            self.sim_time = 0.0;
            self.message_time = 0.0;
            self.signon_complete = false;
        }
        self.connection = state;
    }

    fn disconnect_live(&mut self) {
        self.signon_complete = false;
    }

    fn execute(&mut self, command: &str) {
        info!(command, "No server to run command on; skipped");
    }

    fn print(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Pump the controller once, updating the host's message clock.
fn pump<T: Transport + ?Sized>(
    controller: &mut DemoController,
    host: &mut HeadlessHost,
    transport: &mut T,
) -> NextMessage {
    let next = controller.get_next_message(host, transport);
    if let NextMessage::Delivered(message) = &next {
        debug!(len = message.len(), frame = host.host_frame, "Message delivered");
        host.on_delivered();
    }
    next
}

/// Transport for modes that never receive live traffic.
struct NoTransport;

impl Transport for NoTransport {
    fn try_recv(&mut self) -> io::Result<Option<demoreel_core::NetMessage>> {
        Ok(None)
    }
}

/// Play `name` at the configured cadence until it ends.
pub fn run_playback(
    controller: &mut DemoController,
    host: &mut HeadlessHost,
    settings: &PlaybackSettings,
    name: &str,
) -> Result<u64> {
    controller
        .start_playback(host, name)
        .with_context(|| format!("Failed to play {name}"))?;

    let tick = settings.tick();
    let mut delivered = 0u64;
    loop {
        host.advance(tick);
        match pump(controller, host, &mut NoTransport) {
            NextMessage::Delivered(_) => delivered += 1,
            NextMessage::Pending => thread::sleep(tick),
            NextMessage::Ended(_) => break,
        }
    }
    info!(delivered, "Playback finished");
    Ok(delivered)
}

/// Run a timedemo of `name`, one frame per host frame, as fast as possible.
pub fn run_timedemo(
    controller: &mut DemoController,
    host: &mut HeadlessHost,
    name: &str,
) -> Result<BenchmarkReport> {
    controller
        .start_benchmark(host, name)
        .with_context(|| format!("Failed to start timedemo {name}"))?;

    loop {
        host.advance(Duration::ZERO);
        if let NextMessage::Ended(report) = pump(controller, host, &mut NoTransport) {
            return report.context("Timedemo ended without a report");
        }
    }
}

/// Record live traffic from `transport` until the server disconnects or
/// `max_frames` messages have been captured.
pub fn run_record<T: Transport + ?Sized>(
    controller: &mut DemoController,
    host: &mut HeadlessHost,
    transport: &mut T,
    settings: &PlaybackSettings,
    max_frames: Option<u64>,
) -> Result<u64> {
    if !controller.session().is_recording() {
        bail!("run_record needs an active recording");
    }

    let tick = settings.tick();
    let mut captured = 0u64;
    loop {
        host.advance(tick);
        match pump(controller, host, transport) {
            NextMessage::Delivered(message) => {
                captured += 1;
                if message.is_disconnect() {
                    info!("Server disconnected");
                    break;
                }
                if max_frames.is_some_and(|max| captured >= max) {
                    break;
                }
            }
            NextMessage::Pending => thread::sleep(tick),
            NextMessage::Ended(_) => break,
        }
        if !controller.session().is_recording() {
            bail!("Recording stopped unexpectedly");
        }
    }

    let path = controller
        .stop_recording(host)
        .context("Failed to finish recording")?;
    info!(captured, path = %path.display(), "Capture finished");
    Ok(captured)
}

/// Read commands from stdin while running host frames.
///
/// `quit` or end of input ends the session once nothing is playing.
pub fn run_console<T: Transport + ?Sized>(
    controller: &mut DemoController,
    host: &mut HeadlessHost,
    transport: &mut T,
    settings: &PlaybackSettings,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("console-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn console reader")?;

    let tick = settings.tick();
    let mut input_closed = false;
    loop {
        loop {
            match rx.try_recv() {
                Ok(line) if line.trim() == "quit" => {
                    input_closed = true;
                    break;
                }
                Ok(line) => {
                    dispatch(controller, host, CommandSource::Console, &line);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    input_closed = true;
                    break;
                }
            }
        }

        if input_closed && !controller.session().is_playing() {
            break;
        }

        let benchmarking = controller.session().is_benchmarking();
        host.advance(if benchmarking { Duration::ZERO } else { tick });
        if let NextMessage::Pending = pump(controller, host, transport) {
            if !benchmarking {
                thread::sleep(tick);
            }
        }
    }

    controller.disconnect(host);
    Ok(())
}
