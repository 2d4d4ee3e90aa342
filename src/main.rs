//! demoreel - record, replay and benchmark client demos
//!
//! Headless front end for the demo subsystem

mod config;
mod headless;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{AppConfig, DEFAULT_CONFIG_PATH};
use demoreel_client::DemoController;
use demoreel_net::{DemoSummary, UdpTransport};
use headless::HeadlessHost;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Record, replay and benchmark client demos", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture live server messages into a demo
    Record {
        /// Demo name, resolved against the game directory
        name: String,
        /// Map the server should load first
        #[arg(long)]
        map: Option<String>,
        /// Forced CD track stored in the header
        #[arg(long, allow_hyphen_values = true)]
        track: Option<i32>,
        /// Stop after this many messages
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Play a demo at recorded speed
    Play {
        /// Demo name
        name: String,
    },
    /// Play a demo as fast as possible and report frame rate
    Timedemo {
        /// Demo name
        name: String,
    },
    /// Print a summary of a demo file
    Inspect {
        /// Demo name
        name: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Read record/stop/play/timedemo commands from stdin
    Console,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from_path(&cli.config);

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting demoreel v{}", env!("CARGO_PKG_VERSION"));

    let mut controller = DemoController::new(config.demo.clone());
    let mut host = HeadlessHost::new(&config.playback);

    match cli.command {
        Command::Record {
            name,
            map,
            track,
            frames,
        } => {
            let mut transport = UdpTransport::bind(config.net.bind)?;
            controller
                .start_recording(&mut host, &name, map.as_deref(), track)
                .with_context(|| format!("Failed to record {name}"))?;
            headless::run_record(
                &mut controller,
                &mut host,
                &mut transport,
                &config.playback,
                frames,
            )?;
        }
        Command::Play { name } => {
            headless::run_playback(&mut controller, &mut host, &config.playback, &name)?;
        }
        Command::Timedemo { name } => {
            let report = headless::run_timedemo(&mut controller, &mut host, &name)?;
            info!(
                frames = report.frames,
                seconds = report.seconds,
                fps = report.fps,
                "Timedemo complete"
            );
        }
        Command::Inspect { name, json } => {
            let path = controller.settings().resolve(&name);
            let summary = DemoSummary::scan_path(&path, config.demo.max_header_len)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", path.display());
                println!("  forced track : {}", summary.forced_track);
                println!("  frames       : {}", summary.frames);
                println!("  payload bytes: {}", summary.payload_bytes);
                println!("  largest frame: {}", summary.largest_frame);
                println!("  keepalives   : {}", summary.keepalives);
                println!("  crc32        : {:08x}", summary.crc32);
                println!("  disconnect   : {}", summary.ends_with_disconnect);
            }
        }
        Command::Console => {
            let mut transport = UdpTransport::bind(config.net.bind)?;
            headless::run_console(&mut controller, &mut host, &mut transport, &config.playback)?;
        }
    }

    Ok(())
}
