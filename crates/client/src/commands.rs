//! Console commands: `record`, `stop`, `play` and `timedemo`.

use crate::controller::{DemoController, DemoError};
use demoreel_core::ClientHost;
use thiserror::Error;
use tracing::debug;

/// Usage text for `record`.
pub const RECORD_USAGE: &str = "record <demoname> [<map> [cd track]]";
/// Usage text for `play`.
pub const PLAY_USAGE: &str = "play <demoname> : plays a demo";
/// Usage text for `timedemo`.
pub const TIMEDEMO_USAGE: &str = "timedemo <demoname> : gets demo speeds";

/// Where a command line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Typed locally or read from a config script.
    Console,
    /// Stuffed into the message stream by a server.
    Server,
}

/// A parsed demo command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoCommand {
    /// `record <name> [<map> [<track>]]`
    Record {
        /// Demo name, resolved against the game directory.
        name: String,
        /// Map to load before recording starts.
        map: Option<String>,
        /// Forced track stored in the header.
        track: Option<i32>,
    },
    /// `stop`
    Stop,
    /// `play <name>`
    Play {
        /// Demo name.
        name: String,
    },
    /// `timedemo <name>`
    TimeDemo {
        /// Demo name.
        name: String,
    },
}

/// A command line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Wrong number of arguments; shows the usage line.
    #[error("{0}")]
    Usage(&'static str),
    /// The track argument is not a number.
    #[error("Bad cd track \"{0}\"")]
    InvalidTrack(String),
    /// Not a demo command.
    #[error("Unknown command \"{0}\"")]
    Unknown(String),
}

/// Parse a whitespace-separated command line.
///
/// Returns `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<DemoCommand>, CommandError> {
    let args: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, rest)) = args.split_first() else {
        return Ok(None);
    };

    let command = match verb {
        "record" => match *rest {
            [name] => DemoCommand::Record {
                name: name.to_string(),
                map: None,
                track: None,
            },
            [name, map] => DemoCommand::Record {
                name: name.to_string(),
                map: Some(map.to_string()),
                track: None,
            },
            [name, map, track] => DemoCommand::Record {
                name: name.to_string(),
                map: Some(map.to_string()),
                track: Some(
                    track
                        .parse()
                        .map_err(|_| CommandError::InvalidTrack(track.to_string()))?,
                ),
            },
            _ => return Err(CommandError::Usage(RECORD_USAGE)),
        },
        "stop" => DemoCommand::Stop,
        "play" => match *rest {
            [name] => DemoCommand::Play {
                name: name.to_string(),
            },
            _ => return Err(CommandError::Usage(PLAY_USAGE)),
        },
        "timedemo" => match *rest {
            [name] => DemoCommand::TimeDemo {
                name: name.to_string(),
            },
            _ => return Err(CommandError::Usage(TIMEDEMO_USAGE)),
        },
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Run `command` against `controller`.
///
/// Commands from anywhere but the local console are ignored.
pub fn execute_command<H: ClientHost + ?Sized>(
    controller: &mut DemoController,
    host: &mut H,
    source: CommandSource,
    command: &DemoCommand,
) -> Result<(), DemoError> {
    if source != CommandSource::Console {
        debug!(?command, ?source, "Ignoring demo command from non-console source");
        return Ok(());
    }

    match command {
        DemoCommand::Record { name, map, track } => {
            controller.start_recording(host, name, map.as_deref(), *track)?;
        }
        DemoCommand::Stop => {
            controller.stop_recording(host)?;
        }
        DemoCommand::Play { name } => {
            controller.start_playback(host, name)?;
        }
        DemoCommand::TimeDemo { name } => {
            controller.start_benchmark(host, name)?;
        }
    }
    Ok(())
}

/// Parse and run one console line, printing any failure on the console.
///
/// Returns whether the command ran successfully.
pub fn dispatch<H: ClientHost + ?Sized>(
    controller: &mut DemoController,
    host: &mut H,
    source: CommandSource,
    line: &str,
) -> bool {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(err) => {
            host.print(&err.to_string());
            return false;
        }
    };

    match execute_command(controller, host, source, &command) {
        Ok(()) => true,
        Err(err) => {
            host.print(&err.to_string());
            false
        }
    }
}
