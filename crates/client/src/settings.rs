//! Demo file naming and lookup.

use demoreel_net::DEFAULT_MAX_HEADER_LEN;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Where demos live and how their names are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Directory demo names are resolved against.
    pub game_dir: PathBuf,
    /// Extension appended to names that have none.
    pub default_extension: String,
    /// Longest accepted header line, newline included.
    pub max_header_len: usize,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            game_dir: PathBuf::from("."),
            default_extension: "dem".to_string(),
            max_header_len: DEFAULT_MAX_HEADER_LEN,
        }
    }
}

impl DemoSettings {
    /// Settings rooted at `game_dir`, otherwise default.
    pub fn with_game_dir(game_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
            ..Self::default()
        }
    }

    /// Whether `name` stays inside the game directory: relative, with plain
    /// components only and no `..` anywhere.
    pub fn is_contained(name: &str) -> bool {
        !name.is_empty()
            && !name.contains("..")
            && Path::new(name)
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
    }

    /// Resolve a demo name to a file path, adding the default extension if
    /// the name has none.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let mut path = self.game_dir.join(name);
        if path.extension().is_none() {
            path.set_extension(&self.default_extension);
        }
        path
    }
}
