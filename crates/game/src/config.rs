//! Game configuration (window, input, world generation). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Enable vsync (recommended to avoid tearing).
    #[serde(default = "default_true")]
    pub vsync: bool,
    /// Start in fullscreen.
    #[serde(default)]
    pub fullscreen: bool,
    /// Mouse sensitivity multiplier (1.0 = default).
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// Directory holding models, textures and maps.
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
    /// Heightmap image name inside `asset_dir`, without extension.
    #[serde(default = "default_heightmap")]
    pub heightmap: String,
    /// Vegetation map image name inside `asset_dir`, without extension.
    #[serde(default = "default_vegetation_map")]
    pub vegetation_map: String,
    /// Chance per light vegetation-map pixel of growing a plant.
    #[serde(default = "default_vegetation_density")]
    pub vegetation_density: f32,
    #[serde(default = "default_bird_count")]
    pub bird_count: u32,
    /// Fixed RNG seed for vegetation and birds; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_true() -> bool {
    true
}
fn default_sensitivity() -> f32 {
    1.0
}
fn default_asset_dir() -> PathBuf {
    PathBuf::from("res")
}
fn default_heightmap() -> String {
    "heightmap".to_string()
}
fn default_vegetation_map() -> String {
    "vegetation".to_string()
}
fn default_vegetation_density() -> f32 {
    0.017
}
fn default_bird_count() -> u32 {
    350
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            vsync: default_true(),
            fullscreen: false,
            sensitivity: default_sensitivity(),
            asset_dir: default_asset_dir(),
            heightmap: default_heightmap(),
            vegetation_map: default_vegetation_map(),
            vegetation_density: default_vegetation_density(),
            bird_count: default_bird_count(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// A missing file is created with the defaults so there is something to edit.
    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::parse(&data).unwrap_or_else(|e| {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }),
            Err(_) => {
                log::info!("No config at {:?}, writing defaults", path);
                let config = Self::default();
                config.save_to(path);
                config
            }
        }
    }

    fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Write pretty RON to `path`. Logs on error.
    fn save_to(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = GameConfig::parse("(bird_count: 12, seed: Some(7))").unwrap();
        assert_eq!(config.bird_count, 12);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.vegetation_density, 0.017);
        assert_eq!(config.asset_dir, PathBuf::from("res"));
    }

    #[test]
    fn pretty_output_reads_back() {
        let config = GameConfig {
            sensitivity: 0.5,
            seed: Some(42),
            ..Default::default()
        };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(GameConfig::parse(&text).unwrap(), config);
    }

    fn scratch_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("terrain-engine-{}-{name}.ron", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_file_is_written_with_defaults() {
        let path = scratch_path("missing");
        assert_eq!(GameConfig::load_from(&path), GameConfig::default());
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(GameConfig::parse(&written).unwrap(), GameConfig::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn saved_file_loads_back() {
        let path = scratch_path("saved");
        let config = GameConfig {
            bird_count: 3,
            fullscreen: true,
            ..Default::default()
        };
        config.save_to(&path);
        assert_eq!(GameConfig::load_from(&path), config);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(GameConfig::parse("(window_width: \"wide\")").is_err());
    }
}
