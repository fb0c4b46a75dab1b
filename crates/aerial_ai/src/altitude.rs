//! Altitude band keeping for both families.

use crate::config::{FlightProfile, TorpedoConfig};
use crate::torpedo::{DiveMode, TorpedoState};
use engine_core::DimensionId;
use glam::{IVec3, Vec3};
use voxel::{block_pos, WorldAccess};

/// Vertical nudge chosen by an altitude controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalCorrection {
    None,
    Rise(f32),
    Sink(f32),
}

impl VerticalCorrection {
    /// Signed impulse along +Y.
    pub fn impulse(self) -> Vec3 {
        match self {
            VerticalCorrection::None => Vec3::ZERO,
            VerticalCorrection::Rise(m) => Vec3::Y * m,
            VerticalCorrection::Sink(m) => Vec3::NEG_Y * m,
        }
    }

    pub fn is_none(self) -> bool {
        self == VerticalCorrection::None
    }
}

/// Top of the ground under `pos`: one block above the first non-air block
/// found within `probe_depth` blocks down. Falls back to `fallback_offset`
/// below the entity. Unreadable blocks are skipped.
pub fn ground_height(
    world: &dyn WorldAccess,
    dimension: &DimensionId,
    pos: Vec3,
    probe_depth: i32,
    fallback_offset: f32,
) -> f32 {
    let origin = block_pos(pos);
    for dy in 0..=probe_depth {
        let cell = origin - IVec3::new(0, dy, 0);
        if let Ok(block) = world.block(dimension, cell) {
            if !block.is_air() {
                return (cell.y + 1) as f32;
            }
        }
    }
    pos.y - fallback_offset
}

/// Flying family: fixed nudge back into `[min_altitude, max_altitude]` above
/// `ground`.
pub fn flyer_correction(y: f32, ground: f32, profile: &FlightProfile, impulse: f32) -> VerticalCorrection {
    let height = y - ground;
    if height > profile.max_altitude {
        VerticalCorrection::Sink(impulse)
    } else if height < profile.min_altitude {
        VerticalCorrection::Rise(impulse)
    } else {
        VerticalCorrection::None
    }
}

/// Torpedo family: mode-aware cruise band. The floor check comes first and
/// overrides everything. A dive that is too deep, or one still inside its
/// post-dive grace, is pulled back up and handed to cruise near `cruise_min`.
pub fn torpedo_correction(y: f32, state: &mut TorpedoState, cfg: &TorpedoConfig) -> VerticalCorrection {
    if y < cfg.min_y {
        return VerticalCorrection::Rise(cfg.strong_correction);
    }
    if y < cfg.cruise_min {
        let depth = cfg.cruise_min - y;
        return match state.mode {
            DiveMode::Dive => {
                if depth > cfg.max_dive_depth || state.post_dive_grace > 0 {
                    if depth <= cfg.cruise_margin {
                        state.end_dive(cfg);
                    }
                    VerticalCorrection::Rise(cfg.strong_correction)
                } else {
                    VerticalCorrection::None
                }
            }
            DiveMode::Cruise => {
                if depth > cfg.strong_correction_depth {
                    VerticalCorrection::Rise(cfg.strong_correction)
                } else {
                    VerticalCorrection::Rise(cfg.gentle_correction)
                }
            }
        };
    }
    if y > cfg.cruise_max {
        return VerticalCorrection::Sink(cfg.gentle_correction);
    }
    VerticalCorrection::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxel::{BlockId, SimWorld};

    const BAND: FlightProfile = FlightProfile::new(12.0, 24.0, 0.06, 0.05);

    #[test]
    fn ground_probe_finds_surface() {
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        world.fill_box(&dim, IVec3::new(0, 0, 0), IVec3::new(0, 9, 0), BlockId::Stone);
        let ground = ground_height(&world, &dim, Vec3::new(0.5, 30.5, 0.5), 64, 20.0);
        assert_eq!(ground, 10.0);
    }

    #[test]
    fn ground_probe_falls_back() {
        let world = SimWorld::new();
        let dim = DimensionId::overworld();
        let ground = ground_height(&world, &dim, Vec3::new(0.5, 30.0, 0.5), 8, 20.0);
        assert_eq!(ground, 10.0);
    }

    #[test]
    fn within_band_means_no_correction() {
        // Altitude 30 over ground at 10 is 20 above ground, inside 12..24.
        assert_eq!(flyer_correction(30.0, 10.0, &BAND, 0.04), VerticalCorrection::None);
        assert_eq!(flyer_correction(40.0, 10.0, &BAND, 0.04), VerticalCorrection::Sink(0.04));
        assert_eq!(flyer_correction(15.0, 10.0, &BAND, 0.04), VerticalCorrection::Rise(0.04));
    }

    #[test]
    fn repeated_corrections_never_move_away_from_band() {
        for start in [50.0_f32, 0.0] {
            let mut y = start;
            let mut vy = 0.0;
            for _ in 0..400 {
                let before = y;
                vy += flyer_correction(y, 0.0, &BAND, 0.04).impulse().y;
                y += vy;
                vy *= 0.91;
                if start > BAND.max_altitude {
                    assert!(y <= before + f32::EPSILON);
                } else if y < BAND.min_altitude {
                    assert!(y >= before - f32::EPSILON);
                }
                if (BAND.min_altitude..=BAND.max_altitude).contains(&y) {
                    break;
                }
            }
            assert!((BAND.min_altitude - 1.0..=BAND.max_altitude + 1.0).contains(&y));
        }
    }

    #[test]
    fn torpedo_floor_wins_in_any_mode() {
        let cfg = TorpedoConfig::default();
        let mut state = TorpedoState::default();
        state.mode = DiveMode::Dive;
        assert_eq!(
            torpedo_correction(cfg.min_y - 1.0, &mut state, &cfg),
            VerticalCorrection::Rise(cfg.strong_correction)
        );
    }

    #[test]
    fn torpedo_cruise_band() {
        let cfg = TorpedoConfig::default();
        let mut state = TorpedoState::default();
        assert_eq!(torpedo_correction(100.0, &mut state, &cfg), VerticalCorrection::None);
        assert_eq!(
            torpedo_correction(cfg.cruise_max + 5.0, &mut state, &cfg),
            VerticalCorrection::Sink(cfg.gentle_correction)
        );
        assert_eq!(
            torpedo_correction(cfg.cruise_min - 5.0, &mut state, &cfg),
            VerticalCorrection::Rise(cfg.gentle_correction)
        );
        assert_eq!(
            torpedo_correction(cfg.cruise_min - 20.0, &mut state, &cfg),
            VerticalCorrection::Rise(cfg.strong_correction)
        );
    }

    #[test]
    fn diving_is_free_until_grace_or_depth_limit() {
        let cfg = TorpedoConfig::default();
        let mut state = TorpedoState::default();
        state.mode = DiveMode::Dive;
        assert_eq!(torpedo_correction(cfg.cruise_min - 30.0, &mut state, &cfg), VerticalCorrection::None);

        state.post_dive_grace = 10;
        assert_eq!(
            torpedo_correction(cfg.cruise_min - 30.0, &mut state, &cfg),
            VerticalCorrection::Rise(cfg.strong_correction)
        );
        assert_eq!(state.mode, DiveMode::Dive);

        // Close enough to the cruise floor: handed back to cruise.
        torpedo_correction(cfg.cruise_min - 1.0, &mut state, &cfg);
        assert_eq!(state.mode, DiveMode::Cruise);
    }
}
