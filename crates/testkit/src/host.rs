use demoreel_core::{ClientHost, ConnectionState, ViewAngles};
use tracing::debug;

/// A [`ClientHost`] whose clocks and state are plain fields.
///
/// Tests advance time by assigning to the fields between calls. Console
/// output and executed commands are captured for assertions.
#[derive(Debug, Clone)]
pub struct ManualHost {
    /// Simulation time returned by [`ClientHost::sim_time`].
    pub sim_time: f64,
    /// Message time marker returned by [`ClientHost::message_time`].
    pub message_time: f64,
    /// Host frame counter.
    pub host_frame: u64,
    /// Wall-clock seconds.
    pub realtime: f64,
    /// Signon state; `true` by default so playback is time-gated.
    pub signon_complete: bool,
    /// View angles recorded alongside live messages.
    pub view_angles: ViewAngles,
    /// Connection state, updated by the controller.
    pub connection: ConnectionState,
    /// Every line printed to the console.
    pub console: Vec<String>,
    /// Every command passed to [`ClientHost::execute`].
    pub executed: Vec<String>,
    /// Number of [`ClientHost::disconnect_live`] calls.
    pub disconnects: usize,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self {
            sim_time: 0.0,
            message_time: 0.0,
            host_frame: 0,
            realtime: 0.0,
            signon_complete: true,
            view_angles: ViewAngles::ZERO,
            connection: ConnectionState::Disconnected,
            console: Vec::new(),
            executed: Vec::new(),
            disconnects: 0,
        }
    }
}

impl ManualHost {
    /// Fresh host at time zero, disconnected, signon complete.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `line` was printed verbatim.
    pub fn printed(&self, line: &str) -> bool {
        self.console.iter().any(|printed| printed == line)
    }

    /// Advance one host frame by `dt` seconds of both sim and wall time.
    pub fn step(&mut self, dt: f64) {
        self.host_frame += 1;
        self.sim_time += dt;
        self.realtime += dt;
    }
}

impl ClientHost for ManualHost {
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
        self.realtime
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
        self.connection = state;
    }

    fn disconnect_live(&mut self) {
        self.disconnects += 1;
    }

    fn execute(&mut self, command: &str) {
        debug!(command, "ManualHost execute");
        self.executed.push(command.to_string());
    }

    fn print(&mut self, message: &str) {
        self.console.push(message.to_string());
    }
}
