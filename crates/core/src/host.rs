//! Engine services the demo subsystem depends on.

use crate::{ConnectionState, ViewAngles};

/// The client engine as seen by the demo controller.
///
/// Clocks are read once per call; the controller never caches them across
/// ticks.
pub trait ClientHost {
    /// Current simulation time in seconds.
    fn sim_time(&self) -> f64;

    /// Time marker carried by the most recently parsed server message.
    fn message_time(&self) -> f64;

    /// Monotonic count of host frames run so far.
    fn host_frame(&self) -> u64;

    /// Wall-clock seconds.
    fn realtime(&self) -> f64;

    /// Whether the connection handshake (signon) has finished.
    fn signon_complete(&self) -> bool;

    /// The player's current view angles.
    fn view_angles(&self) -> ViewAngles;

    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Update the connection state.
    fn set_connection_state(&mut self, state: ConnectionState);

    /// Tear down any live server session.
    fn disconnect_live(&mut self);

    /// Run an engine console command such as `map e1m1`.
    fn execute(&mut self, command: &str);

    /// Print a line on the console.
    fn print(&mut self, message: &str);
}
