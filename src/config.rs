//! Tunables for the universe, loadable from TOML.
//!
//! Every table is optional; anything left out falls back to the values the
//! game ships with.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub render: RenderConfig,
    pub camera: CameraConfig,
    pub ship: ShipConfig,
    pub engine: EngineConfig,
    pub turret: TurretConfig,
    pub physics: PhysicsConfig,
    /// Seed for effect randomness. `None` pulls one from the OS.
    pub seed: Option<u64>,
}

impl UniverseConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Integer supersampling factor applied to both axes of the offscreen target.
    pub supersample: u32,
    pub clear_color: [f32; 4],
    pub offscreen_clear_color: [f32; 4],
    pub max_target_dimension: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            supersample: 2,
            clear_color: [0.05, 0.05, 0.05, 1.0],
            offscreen_clear_color: [0.0, 0.0, 0.0, 1.0],
            max_target_dimension: 8192,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub scroll_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom: 0.05,
            min_zoom: 0.001,
            max_zoom: 0.5,
            scroll_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub turn_rate_degrees: f32,
    pub speed: f32,
    pub max_bound: f32,
    pub mass: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            turn_rate_degrees: 90.0,
            speed: 10.0,
            max_bound: 500.0,
            mass: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Expected exhaust particles per second while thrusting.
    pub exhaust_rate: f32,
    /// Multiplier applied to the reversed ship velocity for exhaust drift.
    pub exhaust_velocity_factor: f32,
    pub particle_size: [f32; 2],
    pub particle_life: [f32; 2],
    pub particle_alpha: [f32; 2],
    /// Point sprite size in pixels at full life.
    pub sprite_size: f32,
    pub light_color: [f32; 4],
    pub palette: [[f32; 3]; 2],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exhaust_rate: 20.0,
            exhaust_velocity_factor: 1.0,
            particle_size: [0.1, 0.5],
            particle_life: [0.25, 1.0],
            particle_alpha: [2.0, 5.0],
            sprite_size: 10.0,
            light_color: [239.0 / 255.0, 217.0 / 255.0, 105.0 / 255.0, 1.0],
            palette: [
                [206.0 / 255.0, 175.0 / 255.0, 0.0],
                [1.0, 247.0 / 255.0, 216.0 / 255.0],
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TurretConfig {
    pub arc_degrees: f32,
    pub muzzle_light_color: [f32; 4],
}

impl Default for TurretConfig {
    fn default() -> Self {
        Self {
            arc_degrees: 70.0,
            muzzle_light_color: [1.0, 0.1, 0.2, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Pairwise attraction between free bodies registered with the universe.
    pub gravitation: bool,
}
