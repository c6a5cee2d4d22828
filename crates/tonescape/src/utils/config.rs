//! Configuration file management.
//!
//! Handles loading and saving user preferences to `~/.tonescape.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tonescape_engine::{EngineSettings, ModeKind};

const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;

const CONFIG_TEMPLATE: &str = r#"# tonescape configuration file

# Mode shown at startup: mosaic, sphere, shader or tunnel (default: mosaic)
# default_mode = "mosaic"

# Seed for scene construction; random every build when unset
# seed = 42

# Window size when not fullscreen
# window_width = 1280
# window_height = 720

# Last loaded track (auto-saved)
# last_track = "/path/to/track.mp3"

# =============================================================================
# Modes
# =============================================================================

# mosaic_grid = [30, 30]      # Tiles across and down
# sphere_detail = 3           # Icosahedron subdivisions (0-6)
# tunnel_rings = 15
# tunnel_particles = 500

# =============================================================================
# Analysis
# =============================================================================

# smoothing = 0.8             # Spectrum smoothing between frames (0-1)
"#;

#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
    pub default_mode: Option<ModeKind>,
    pub seed: Option<u64>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
    pub last_track: Option<PathBuf>,

    // Modes (flattened for simpler TOML)
    pub mosaic_grid: Option<[u32; 2]>,
    pub sphere_detail: Option<u32>,
    pub tunnel_rings: Option<usize>,
    pub tunnel_particles: Option<usize>,

    pub smoothing: Option<f32>,
}

impl Config {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tonescape.toml"))
    }

    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };

        // Create template file if it doesn't exist
        if !path.exists() {
            match fs::write(&path, CONFIG_TEMPLATE) {
                Ok(()) => log::info!("Created config template at {}", path.display()),
                Err(e) => log::warn!("Could not write {}: {}", path.display(), e),
            }
        }

        match fs::read_to_string(&path) {
            Ok(s) => Self::parse(&s).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn save(&self) {
        let Some(path) = Self::path() else {
            return;
        };
        match toml::to_string(self) {
            Ok(content) => match fs::write(&path, content) {
                Ok(()) => log::debug!("Config saved to {}", path.display()),
                Err(e) => log::warn!("Could not save {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }

    pub fn set_last_track(&mut self, path: PathBuf) {
        self.last_track = Some(path);
        self.save();
    }

    pub fn window_size(&self) -> (u32, u32) {
        (
            self.window_width.unwrap_or(DEFAULT_WINDOW_WIDTH),
            self.window_height.unwrap_or(DEFAULT_WINDOW_HEIGHT),
        )
    }

    /// Engine settings from the file, with CLI overrides applied
    pub fn engine(&self, mode: Option<ModeKind>, seed: Option<u64>) -> EngineSettings {
        EngineSettings {
            default_mode: mode.or(self.default_mode),
            seed: seed.or(self.seed),
            mosaic_grid: self.mosaic_grid,
            sphere_detail: self.sphere_detail,
            tunnel_rings: self.tunnel_rings,
            tunnel_particles: self.tunnel_particles,
            smoothing: self.smoothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        assert_eq!(Config::parse(CONFIG_TEMPLATE).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
            default_mode = "tunnel"
            mosaic_grid = [10, 20]
            window_width = 640
            "#,
        )
        .unwrap();
        assert_eq!(config.default_mode, Some(ModeKind::Tunnel));
        assert_eq!(config.window_size(), (640, DEFAULT_WINDOW_HEIGHT));

        let settings = config.engine(None, None);
        assert_eq!(settings.default_mode(), ModeKind::Tunnel);
        assert_eq!(settings.mosaic_grid(), [10, 20]);
        assert_eq!(settings.sphere_detail(), 3);
    }

    #[test]
    fn test_cli_overrides_file() {
        let config = Config::parse("default_mode = \"sphere\"\nseed = 1").unwrap();
        let settings = config.engine(Some(ModeKind::Shader), Some(9));
        assert_eq!(settings.default_mode(), ModeKind::Shader);
        assert_eq!(settings.seed, Some(9));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Config::parse("default_mode = \"plasma\"").is_err());
    }
}
