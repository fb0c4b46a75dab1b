//! Common components used across the engine.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Velocity component for moving entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub linear: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self { linear }
    }

    /// Add an instantaneous impulse on top of the current velocity.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.linear += impulse;
    }

    /// Exponential drag, `factor` is the fraction kept per step.
    pub fn damp(&mut self, factor: f32) {
        self.linear *= factor.clamp(0.0, 1.0);
    }
}

/// Player game mode. Creative and spectator players are never targeted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Survival,
    Adventure,
    Creative,
    Spectator,
}

impl GameMode {
    pub fn is_targetable(self) -> bool {
        matches!(self, GameMode::Survival | GameMode::Adventure)
    }
}
