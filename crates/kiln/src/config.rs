//! Engine configuration.
//!
//! Everything has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "title": "Asteroids", "width": 1280, "height": 720 }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::ConfigError;

/// Window, loop and resource settings for a [`Game`](crate::game::Game).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Seconds per fixed update step.
    pub fixed_timestep: f32,
    /// Upper bound on fixed steps run in one frame after a stall.
    pub max_steps_per_frame: u32,
    pub clear_color: Color,
    /// Vertex capacity for batch renderers built from this config.
    pub batch_capacity: u32,
    pub resources: ResourcePaths,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "kiln".to_owned(),
            width: 960,
            height: 540,
            vsync: true,
            fixed_timestep: 1.0 / 60.0,
            max_steps_per_frame: 5,
            clear_color: Color::WHITE,
            batch_capacity: 4096,
            resources: ResourcePaths::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_json(&source)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), but falls back to defaults with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("using default config ({}: {e})", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Where the [`ResourceManager`](crate::assets::ResourceManager) looks for
/// each kind of file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePaths {
    pub textures: PathBuf,
    pub meshes: PathBuf,
    pub shaders: PathBuf,
    pub fonts: PathBuf,
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self {
            textures: PathBuf::from("Resources/Textures"),
            meshes: PathBuf::from("Resources/Meshes"),
            shaders: PathBuf::from("Resources/Shaders"),
            fonts: PathBuf::from("Resources/Fonts"),
        }
    }
}

impl ResourcePaths {
    /// All four directories under one root.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            textures: root.join("Textures"),
            meshes: root.join("Meshes"),
            shaders: root.join("Shaders"),
            fonts: root.join("Fonts"),
        }
    }
}
