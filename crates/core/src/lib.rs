#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod angles;
pub mod host;
pub mod message;

use serde::{Deserialize, Serialize};

pub use angles::ViewAngles;
pub use host::ClientHost;
pub use message::{MessageError, NetMessage};

/// Largest protocol message a client will accept, in bytes.
///
/// Applies to live datagrams and to every frame stored in a demo file.
pub const MAX_MSGLEN: usize = 8000;

/// Server command byte for a no-op keepalive.
pub const SVC_NOP: u8 = 1;

/// Server command byte that tells the client the session is over.
pub const SVC_DISCONNECT: u8 = 2;

/// Client connection state as seen by the demo subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No server and no demo feeding the client.
    #[default]
    Disconnected,
    /// Messages are flowing, from a server or from a demo file.
    Connected,
}

impl ConnectionState {
    /// Whether messages are expected to arrive.
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}
