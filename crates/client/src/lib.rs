#![warn(missing_docs)]
//! Demo recording, playback and timedemo for the client message loop.
//!
//! When a demo is playing back, live transport reads are skipped and messages
//! come from the demo file instead. Whenever simulation time passes the last
//! received message, another frame is read.

pub mod commands;
mod controller;
mod session;
mod settings;
mod source;
mod timing;

pub use commands::{
    dispatch, execute_command, parse_command, CommandError, CommandSource, DemoCommand,
};
pub use controller::{DemoController, DemoError};
pub use demoreel_core::ClientHost;
pub use session::{DemoMode, ModeKind, Playback, Recording, SessionState};
pub use settings::DemoSettings;
pub use source::NextMessage;
pub use timing::{playback_gate, BenchmarkClock, BenchmarkReport, GateDecision};
