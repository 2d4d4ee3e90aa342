//! Application configuration loaded from `config/demoreel.toml`.

use demoreel_client::DemoSettings;
use serde::Deserialize;
use std::{fs, net::SocketAddr, path::Path, time::Duration};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/demoreel.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub demo: DemoSettings,
    pub net: NetSettings,
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetSettings {
    /// Local address live messages are received on.
    pub bind: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Simulated server message cadence during headless playback.
    pub frame_interval_ms: u64,
    /// Length of one host frame outside timedemo.
    pub tick_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            demo: DemoSettings::default(),
            net: NetSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

impl Default for NetSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 27005)),
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 50,
            tick_ms: 10,
        }
    }
}

impl PlaybackSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Host frame length, never zero.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl AppConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AppConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Config not found at {}. Using defaults", path.display());
                }
                AppConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = AppConfig::load_from_path(Path::new("/nonexistent/demoreel.toml"));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.net.bind.port(), 27005);
        assert_eq!(cfg.playback.frame_interval_ms, 50);
        assert_eq!(cfg.demo.max_header_len, 32);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demoreel.toml");
        fs::write(
            &path,
            "log_level = \"debug\"\n[demo]\ngame_dir = \"id1\"\n[playback]\ntick_ms = 0\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from_path(&path);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.demo.game_dir, PathBuf::from("id1"));
        assert_eq!(cfg.demo.default_extension, "dem");
        assert_eq!(cfg.playback.tick(), Duration::from_millis(1));
        assert_eq!(cfg.playback.frame_interval_ms, 50);
    }

    #[test]
    fn malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "log_level = [").unwrap();
        assert_eq!(AppConfig::load_from_path(&path).log_level, "info");
    }
}
