//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub eject: EjectConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            world: WorldConfig::default(),
            player: PlayerConfig::default(),
            food: FoodConfig::default(),
            eject: EjectConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Tick interval in milliseconds (16 ms ~= 60 Hz).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_tick_interval() -> u64 {
    16
}

/// World arena configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_size")]
    pub width: f32,
    #[serde(default = "default_world_size")]
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_world_size(),
            height: default_world_size(),
        }
    }
}

fn default_world_size() -> f32 {
    4000.0
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Mass a player spawns with (radius = sqrt(mass)).
    #[serde(default = "default_start_mass")]
    pub start_mass: f32,
    /// Base speed at level 1.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    /// Linear speed bonus per level above 1.
    #[serde(default = "default_level_speed_bonus")]
    pub level_speed_bonus: f32,
    /// Drag term: larger cells move proportionally slower.
    #[serde(default = "default_radius_drag")]
    pub radius_drag: f32,
    #[serde(default = "default_max_nick_length")]
    pub max_nick_length: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_mass: default_start_mass(),
            base_speed: default_base_speed(),
            level_speed_bonus: default_level_speed_bonus(),
            radius_drag: default_radius_drag(),
            max_nick_length: default_max_nick_length(),
        }
    }
}

fn default_start_mass() -> f32 {
    200.0
}
fn default_base_speed() -> f32 {
    3.8
}
fn default_level_speed_bonus() -> f32 {
    0.01
}
fn default_radius_drag() -> f32 {
    0.02
}
fn default_max_nick_length() -> usize {
    30
}

/// Food configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Mass of a single pellet (mass 25 => radius 5).
    #[serde(default = "default_food_mass")]
    pub mass: f32,
    /// Population the replenishment stage restores each tick.
    #[serde(default = "default_food_target")]
    pub target_amount: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            mass: default_food_mass(),
            target_amount: default_food_target(),
        }
    }
}

fn default_food_mass() -> f32 {
    25.0
}
fn default_food_target() -> usize {
    400
}

/// Mass donation (eject) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EjectConfig {
    /// Mass carried by one donated chunk.
    #[serde(default = "default_eject_mass")]
    pub mass: f32,
    /// Initial speed of the chunk, along the donor's input angle.
    #[serde(default = "default_eject_speed")]
    pub speed: f32,
    /// Per-tick velocity decay factor.
    #[serde(default = "default_eject_decay")]
    pub decay: f32,
    /// Chunks slower than this are despawned as settled.
    #[serde(default = "default_eject_min_speed")]
    pub min_speed: f32,
    /// Minimum cell mass required to donate.
    #[serde(default = "default_min_donor_mass")]
    pub min_donor_mass: f32,
}

impl Default for EjectConfig {
    fn default() -> Self {
        Self {
            mass: default_eject_mass(),
            speed: default_eject_speed(),
            decay: default_eject_decay(),
            min_speed: default_eject_min_speed(),
            min_donor_mass: default_min_donor_mass(),
        }
    }
}

fn default_eject_mass() -> f32 {
    40.0
}
fn default_eject_speed() -> f32 {
    18.0
}
fn default_eject_decay() -> f32 {
    0.95
}
fn default_eject_min_speed() -> f32 {
    0.05
}
fn default_min_donor_mass() -> f32 {
    100.0
}
