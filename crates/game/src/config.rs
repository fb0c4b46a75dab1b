//! Simulation configuration. Loaded from config.ron at startup.

use aerial_ai::AiConfig;
use anyhow::{Context, Result};
use engine_core::{DimensionId, GameMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use voxel::TerrainConfig;

/// A player placed at startup. Height is taken from the terrain surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpawn {
    pub name: String,
    #[serde(default = "DimensionId::overworld")]
    pub dimension: DimensionId,
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub game_mode: GameMode,
}

/// Headless run settings. Every field has a default so a partial
/// `config.ron` only needs to name what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seeds terrain, spawn placement and the AI's random rolls.
    pub seed: u64,
    /// Game ticks to simulate.
    pub ticks: u64,
    /// Log a summary every this many game ticks.
    pub report_every: u64,
    pub terrain: TerrainConfig,
    pub players: Vec<PlayerSpawn>,
    /// Creatures spawned per flying type in the creature table.
    pub flyers_per_type: u32,
    /// Creatures spawned per torpedo type in the creature table.
    pub torpedoes_per_type: u32,
    /// Horizontal spread of creature spawns around the origin.
    pub spawn_radius: f32,
    pub ai: AiConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            ticks: 2400,
            report_every: 200,
            terrain: TerrainConfig::default(),
            players: vec![
                PlayerSpawn {
                    name: "scout".to_string(),
                    dimension: DimensionId::overworld(),
                    x: 0.0,
                    z: 0.0,
                    game_mode: GameMode::Survival,
                },
                PlayerSpawn {
                    name: "builder".to_string(),
                    dimension: DimensionId::overworld(),
                    x: 20.0,
                    z: -12.0,
                    game_mode: GameMode::Creative,
                },
            ],
            flyers_per_type: 6,
            torpedoes_per_type: 3,
            spawn_radius: 40.0,
            ai: AiConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Load from an explicit path. Unlike [`SimConfig::load`], failures are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ron::from_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}
