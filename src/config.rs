//! # Engine Configuration
//!
//! Runtime settings read once at startup from a JSON file. Every section
//! falls back to defaults field by field, so a partial file is valid. A
//! missing file is not an error.
//!
//! ```json
//! {
//!     "render": { "load_radius": 6, "remesh_budget": 4 },
//!     "world": { "seed": 42 }
//! }
//! ```

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "VOXEL_WORLD_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub world: WorldConfig,
    pub camera: CameraConfig,
    /// Number of chunk generation worker threads. Zero runs generation inline.
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Radius in chunks of the cube kept resident around the camera.
    pub load_radius: i32,
    /// Maximum number of chunk meshes rebuilt per frame.
    pub remesh_budget: usize,
    /// Frame cap. Zero means uncapped.
    pub max_fps: u32,
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Optional WGSL file replacing the built-in chunk shader.
    pub shader_path: Option<PathBuf>,
    pub atlas_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Terrain seed. When absent the saved seed is used, or a random one.
    pub seed: Option<u32>,
    pub save_directory: PathBuf,
    /// Whether edited chunks are written to disk.
    pub persist: bool,
    /// Number of unloaded edited chunks held in memory before being written.
    pub stash_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Movement speed in blocks per second.
    pub speed: f32,
    pub sensitivity: f32,
    /// Maximum distance in blocks for placing and removing blocks.
    pub reach: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            world: WorldConfig::default(),
            camera: CameraConfig::default(),
            workers: 4,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("Voxel World"),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            load_radius: 4,
            remesh_budget: 8,
            max_fps: 0,
            fov_degrees: 70.0,
            z_near: 0.1,
            z_far: 1000.0,
            shader_path: None,
            atlas_path: PathBuf::from("assets/textures/atlas.png"),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            save_directory: PathBuf::from("saves/world"),
            persist: true,
            stash_capacity: 64,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: 12.0,
            sensitivity: 0.4,
            reach: 8.0,
        }
    }
}

/// Limits applied by [`EngineConfig::validated`].
pub const LOAD_RADIUS_RANGE: std::ops::RangeInclusive<i32> = 1..=16;
pub const MAX_WORKERS: usize = 32;

impl EngineConfig {
    /// Reads the configuration from `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Loads the configuration from the path named by [`CONFIG_PATH_ENV`] or
    /// [`DEFAULT_CONFIG_PATH`]. Any problem is logged and defaults are used.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = match Self::from_file(&path) {
            Ok(Some(config)) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Ok(None) => {
                info!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        };

        config.validated()
    }

    /// Clamps every value into the range the engine can run with.
    pub fn validated(mut self) -> Self {
        let render = &mut self.render;
        render.load_radius = render
            .load_radius
            .clamp(*LOAD_RADIUS_RANGE.start(), *LOAD_RADIUS_RANGE.end());
        render.remesh_budget = render.remesh_budget.max(1);
        render.fov_degrees = render.fov_degrees.clamp(30.0, 120.0);
        render.z_near = render.z_near.max(0.01);
        if render.z_far <= render.z_near {
            render.z_far = render.z_near * 1000.0;
        }

        self.window.width = self.window.width.max(1);
        self.window.height = self.window.height.max(1);
        self.world.stash_capacity = self.world.stash_capacity.max(1);
        self.camera.reach = self.camera.reach.clamp(1.0, 64.0);
        self.camera.speed = self.camera.speed.max(0.0);
        self.workers = self.workers.min(MAX_WORKERS);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EngineConfig::from_file(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "render": { "load_radius": 7 }, "world": { "seed": 9 } }"#)
            .unwrap();

        let config = EngineConfig::from_file(&path).unwrap().unwrap();
        assert_eq!(config.render.load_radius, 7);
        assert_eq!(config.render.remesh_budget, RenderConfig::default().remesh_budget);
        assert_eq!(config.world.seed, Some(9));
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ render: ").unwrap();

        assert!(matches!(
            EngineConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn validation_clamps_out_of_range_values() {
        let mut config = EngineConfig::default();
        config.render.load_radius = 100;
        config.render.remesh_budget = 0;
        config.render.z_near = 5.0;
        config.render.z_far = 1.0;
        config.workers = 1000;

        let config = config.validated();
        assert_eq!(config.render.load_radius, 16);
        assert_eq!(config.render.remesh_budget, 1);
        assert!(config.render.z_far > config.render.z_near);
        assert_eq!(config.workers, MAX_WORKERS);
    }
}
