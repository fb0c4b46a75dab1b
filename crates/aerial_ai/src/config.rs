//! Tuning tables for the aerial AI. Every field has a default so partial
//! RON files only need to name what they change.

use crate::debug::DebugFlags;
use serde::{Deserialize, Serialize};
use voxel::BlockId;

/// Altitude band and force constants assigned to a flyer for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightProfile {
    /// Minimum height above ground.
    pub min_altitude: f32,
    /// Maximum height above ground.
    pub max_altitude: f32,
    pub horizontal_impulse: f32,
    pub vertical_impulse: f32,
}

impl FlightProfile {
    pub const fn new(min_altitude: f32, max_altitude: f32, horizontal_impulse: f32, vertical_impulse: f32) -> Self {
        Self {
            min_altitude,
            max_altitude,
            horizontal_impulse,
            vertical_impulse,
        }
    }
}

/// Which profile a flyer was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightRole {
    LowProfile,
    HighProfile,
}

/// Tuning for the flying family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub target_range: f32,
    pub low_profile: FlightProfile,
    pub high_profile: FlightProfile,
    /// Chance a new flyer is assigned the high profile.
    pub high_profile_chance: f64,
    /// Fixed impulse used to nudge back into the band.
    pub altitude_impulse: f32,
    /// Blocks probed below the entity when looking for ground.
    pub ground_probe_depth: i32,
    /// Assumed height above ground when the probe finds nothing.
    pub ground_fallback_offset: f32,
    /// Blocks probed above the entity for low ceilings.
    pub ceiling_probe_height: i32,
    pub ceiling_push: f32,
    pub ceiling_jitter: f32,
    /// Vertical impulse per block of vertical displacement, before clamping.
    pub vertical_gain: f32,
    /// Drift fires once per this many ticks.
    pub drift_interval: u64,
    /// Ticks without a target before tracking is dropped and the flyer wanders.
    pub passive_wander_ticks: u64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            target_range: 48.0,
            low_profile: FlightProfile::new(6.0, 14.0, 0.08, 0.06),
            high_profile: FlightProfile::new(12.0, 24.0, 0.06, 0.05),
            high_profile_chance: 0.5,
            altitude_impulse: 0.04,
            ground_probe_depth: 64,
            ground_fallback_offset: 20.0,
            ceiling_probe_height: 3,
            ceiling_push: 0.1,
            ceiling_jitter: 0.05,
            vertical_gain: 0.05,
            drift_interval: 40,
            passive_wander_ticks: 2400,
        }
    }
}

impl FlightConfig {
    pub fn profile(&self, role: FlightRole) -> &FlightProfile {
        match role {
            FlightRole::LowProfile => &self.low_profile,
            FlightRole::HighProfile => &self.high_profile,
        }
    }
}

/// Tuning for the torpedo family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorpedoConfig {
    pub target_range: f32,
    // ── Altitude ────────────────────────────────────────────────────────
    pub cruise_min: f32,
    pub cruise_max: f32,
    /// Absolute floor. Nothing is broken below it and it always wins.
    pub min_y: f32,
    /// Deepest a dive may go below `cruise_min`.
    pub max_dive_depth: f32,
    /// Distance below `cruise_min` at which cruise correction turns strong.
    pub strong_correction_depth: f32,
    /// Within this of `cruise_min` a forced climb hands back to cruise.
    pub cruise_margin: f32,
    pub gentle_correction: f32,
    pub strong_correction: f32,
    // ── Motion ──────────────────────────────────────────────────────────
    pub forward_force: f32,
    /// Horizontal boost while diving, relative to `forward_force`.
    pub dive_speed_multiplier: f32,
    pub dive_impulse: f32,
    /// Target at least this far below counts as "very far below".
    pub deep_dive_distance: f32,
    pub deep_dive_multiplier: f32,
    pub rise_impulse: f32,
    pub rise_boost: f32,
    pub moderate_rise: f32,
    /// Height above `min_y` considered "near the floor".
    pub near_floor_margin: f32,
    /// Vertical offsets inside this band fly level.
    pub vertical_deadband: f32,
    pub drift_interval: u64,
    // ── Dive state machine ──────────────────────────────────────────────
    /// Horizontal distance at which a dive may begin.
    pub dive_range: f32,
    /// Inside this horizontal distance the re-dive cooldown is ignored.
    pub very_close_distance: f32,
    /// A dive continues out to `dive_range * dive_exit_factor`.
    pub dive_exit_factor: f32,
    /// A dive aborts if the target climbs this far above.
    pub dive_abort_height: f32,
    pub player_dive_chance: f64,
    pub mob_dive_chance: f64,
    pub action_cooldown_ticks: u32,
    pub redive_cooldown_ticks: u32,
    pub post_dive_grace_ticks: u32,
    /// Delay before re-rolling after a failed dive roll.
    pub roll_retry_ticks: u32,
    pub passive_wander_ticks: u64,
    /// Remembered targets re-attach to a player within this radius.
    pub reacquire_radius: f32,
    // ── Terrain ─────────────────────────────────────────────────────────
    pub blocks_per_tick: u32,
    /// Lifetime destruction budget.
    pub max_blocks: u32,
    /// Half-width of the destructive scan cube (1 = 3×3×3).
    pub structure_scan_radius: i32,
    /// Solid blocks the torpedo may "see" through.
    pub see_through_tolerance: u32,
    /// Blocks tunnelled before backing off.
    pub tunnel_tally_threshold: u32,
    pub backoff_ticks: u32,
    /// Target must be at least this far above before breaking upward.
    pub upward_break_margin: f32,
    pub upward_break_horizontal: f32,
    pub upward_break_limit: i32,
    pub scar_radius: i32,
    pub flight_sound_interval: u64,
}

impl Default for TorpedoConfig {
    fn default() -> Self {
        Self {
            target_range: 64.0,
            cruise_min: 90.0,
            cruise_max: 110.0,
            min_y: 40.0,
            max_dive_depth: 60.0,
            strong_correction_depth: 10.0,
            cruise_margin: 2.0,
            gentle_correction: 0.03,
            strong_correction: 0.12,
            forward_force: 0.08,
            dive_speed_multiplier: 1.8,
            dive_impulse: 0.1,
            deep_dive_distance: 15.0,
            deep_dive_multiplier: 1.5,
            rise_impulse: 0.08,
            rise_boost: 1.5,
            moderate_rise: 0.05,
            near_floor_margin: 6.0,
            vertical_deadband: 2.0,
            drift_interval: 40,
            dive_range: 24.0,
            very_close_distance: 6.0,
            dive_exit_factor: 1.5,
            dive_abort_height: 12.0,
            player_dive_chance: 0.95,
            mob_dive_chance: 0.30,
            action_cooldown_ticks: 20,
            redive_cooldown_ticks: 100,
            post_dive_grace_ticks: 40,
            roll_retry_ticks: 20,
            passive_wander_ticks: 1200,
            reacquire_radius: 16.0,
            blocks_per_tick: 4,
            max_blocks: 50,
            structure_scan_radius: 1,
            see_through_tolerance: 3,
            tunnel_tally_threshold: 6,
            backoff_ticks: 20,
            upward_break_margin: 2.0,
            upward_break_horizontal: 3.0,
            upward_break_limit: 3,
            scar_radius: 3,
            flight_sound_interval: 60,
        }
    }
}

/// Behavior family of a configured creature type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CreatureKind {
    Flying(FlightConfig),
    Torpedo(TorpedoConfig),
}

/// One row of the creature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSpec {
    pub type_id: String,
    pub kind: CreatureKind,
}

/// Break sound chosen when a block name contains any of `keywords`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundGroup {
    pub keywords: Vec<String>,
    pub sound: String,
}

impl SoundGroup {
    pub fn new(keywords: &[&str], sound: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            sound: sound.to_string(),
        }
    }
}

/// Scheduler cadence, culling and cache windows (all in game ticks).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run a pass every N game ticks.
    pub interval: u64,
    /// Entities farther than this from every player are not processed.
    pub processing_radius: f32,
    pub player_cache_ticks: u64,
    pub mob_cache_ticks: u64,
    pub target_cache_ticks: u64,
    /// Coarse cadence for verifying cached references against the world.
    pub cleanup_interval: u64,
    /// Mob candidates are pre-filtered to `target_range * mob_search_factor`.
    pub mob_search_factor: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: 5,
            processing_radius: 128.0,
            player_cache_ticks: 10,
            mob_cache_ticks: 10,
            target_cache_ticks: 10,
            cleanup_interval: 200,
            mob_search_factor: 2.0,
        }
    }
}

/// Complete AI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub scheduler: SchedulerConfig,
    /// Ordered creature table; processing follows this order.
    pub creatures: Vec<CreatureSpec>,
    /// Mob families that count as hostile targets.
    pub target_families: Vec<String>,
    pub indestructible: Vec<BlockId>,
    /// Checked in order; first group with a matching keyword wins.
    pub break_sounds: Vec<SoundGroup>,
    pub default_break_sound: String,
    pub debug: DebugFlags,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            creatures: vec![
                CreatureSpec {
                    type_id: "phantom".to_string(),
                    kind: CreatureKind::Flying(FlightConfig::default()),
                },
                CreatureSpec {
                    type_id: "sky_torpedo".to_string(),
                    kind: CreatureKind::Torpedo(TorpedoConfig::default()),
                },
            ],
            target_families: vec!["animal".to_string(), "villager".to_string()],
            indestructible: vec![BlockId::Bedrock, BlockId::Barrier, BlockId::Obsidian],
            break_sounds: default_break_sounds(),
            default_break_sound: "block.stone.break".to_string(),
            debug: DebugFlags::default(),
        }
    }
}

fn default_break_sounds() -> Vec<SoundGroup> {
    vec![
        SoundGroup::new(&["glass", "ice"], "block.glass.break"),
        SoundGroup::new(&["log", "planks", "wood", "fence", "door"], "block.wood.break"),
        SoundGroup::new(&["leaves", "grass", "fern", "dandelion"], "block.grass.break"),
        SoundGroup::new(&["sand"], "block.sand.break"),
        SoundGroup::new(&["gravel", "dirt", "clay"], "block.gravel.break"),
        SoundGroup::new(&["snow"], "block.snow.break"),
    ]
}

impl AiConfig {
    pub fn creature(&self, type_id: &str) -> Option<&CreatureSpec> {
        self.creatures.iter().find(|c| c.type_id == type_id)
    }

    /// Force hand-edited values into the ranges the random rolls accept:
    /// chances into `[0, 1]` (NaN becomes 0) and jitter non-negative.
    pub fn sanitize(&mut self) {
        for spec in &mut self.creatures {
            match &mut spec.kind {
                CreatureKind::Flying(f) => {
                    f.high_profile_chance = probability(f.high_profile_chance);
                    f.ceiling_jitter = non_negative(f.ceiling_jitter);
                }
                CreatureKind::Torpedo(t) => {
                    t.player_dive_chance = probability(t.player_dive_chance);
                    t.mob_dive_chance = probability(t.mob_dive_chance);
                }
            }
        }
    }
}

fn probability(p: f64) -> f64 {
    if p.is_nan() {
        log::warn!("Chance is NaN, treating as 0");
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

fn non_negative(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.abs()
    }
}
