//! Torpedo family: cruise high, dive on targets, tunnel through terrain.
//!
//! Each torpedo runs a two-state machine. In [`DiveMode::Cruise`] it holds the
//! cruise band and closes on targets horizontally; once a target is inside
//! dive range and the cooldowns allow, a dive is rolled for. In
//! [`DiveMode::Dive`] it accelerates toward the target, breaking blocks when
//! the line of sight is obstructed, and backs off briefly after grinding
//! through too much in one go.
//!
//! Cooldowns are counted in game ticks and decremented by the scheduler
//! interval on every pass.

use crate::altitude::{torpedo_correction, VerticalCorrection};
use crate::config::TorpedoConfig;
use crate::debug::trace_ai;
use crate::outcome::Outcome;
use crate::scheduler::BehaviorContext;
use crate::sight::{can_see_target_through_blocks, SightRules};
use crate::steering::{apply_drift, steer_towards};
use crate::target::TargetInfo;
use glam::{IVec3, Vec3};
use rand::Rng;
use voxel::{EntitySnapshot, WorldAccess};

/// Sound played periodically while a torpedo is airborne.
pub const FLIGHT_SOUND: &str = "entity.torpedo.whoosh";

/// Horizontal distance at which a remembered spot counts as reached.
const ARRIVAL_DISTANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiveMode {
    #[default]
    Cruise,
    Dive,
}

/// Per-torpedo runtime state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TorpedoState {
    pub mode: DiveMode,
    /// Blocks any new dive decision (set on entry and after a failed roll).
    pub action_cooldown: u32,
    /// Blocks re-entry after a dive unless the target is very close.
    pub redive_cooldown: u32,
    /// After a dive ends, any further dive is pulled back to cruise.
    pub post_dive_grace: u32,
    pub dive_started_tick: Option<u64>,
    pub last_target_pos: Option<Vec3>,
    pub last_seen_tick: Option<u64>,
    /// Blocks broken since the last backoff.
    pub tunnel_tally: u32,
    pub backoff_remaining: u32,
    pub last_flight_sound_tick: Option<u64>,
    pub activation_logged: bool,
}

impl TorpedoState {
    pub fn is_diving(&self) -> bool {
        self.mode == DiveMode::Dive
    }

    /// Count every cooldown down by `elapsed` ticks.
    pub fn tick_cooldowns(&mut self, elapsed: u32) {
        self.action_cooldown = self.action_cooldown.saturating_sub(elapsed);
        self.redive_cooldown = self.redive_cooldown.saturating_sub(elapsed);
        self.post_dive_grace = self.post_dive_grace.saturating_sub(elapsed);
    }

    pub fn enter_dive(&mut self, cfg: &TorpedoConfig, target_pos: Vec3, tick: u64) {
        self.mode = DiveMode::Dive;
        self.action_cooldown = cfg.action_cooldown_ticks;
        self.redive_cooldown = cfg.redive_cooldown_ticks;
        self.last_target_pos = Some(target_pos);
        self.dive_started_tick = Some(tick);
        self.tunnel_tally = 0;
        self.backoff_remaining = 0;
    }

    /// Back to cruise. The re-dive cooldown is re-armed from this moment.
    pub fn end_dive(&mut self, cfg: &TorpedoConfig) {
        self.mode = DiveMode::Cruise;
        self.redive_cooldown = cfg.redive_cooldown_ticks;
        self.post_dive_grace = cfg.post_dive_grace_ticks;
        self.dive_started_tick = None;
        self.tunnel_tally = 0;
        self.backoff_remaining = 0;
    }
}

/// What one torpedo did this pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorpedoReport {
    pub mode: DiveMode,
    pub dive_entered: bool,
    pub dive_ended: bool,
    pub blocks_broken: u32,
    pub detonated: bool,
    pub correction: VerticalCorrection,
    /// Worst outcome of the impulses requested this pass, if any were.
    pub motion: Option<Outcome>,
    /// Set when a spent torpedo that is still in the world was asked to
    /// leave it again.
    pub removal_retry: Option<Outcome>,
}

impl TorpedoReport {
    fn moved(&mut self, outcome: Outcome) {
        self.motion = Outcome::fold(self.motion, outcome);
    }
}

impl Default for TorpedoReport {
    fn default() -> Self {
        Self {
            mode: DiveMode::Cruise,
            dive_entered: false,
            dive_ended: false,
            blocks_broken: 0,
            detonated: false,
            correction: VerticalCorrection::None,
            motion: None,
            removal_retry: None,
        }
    }
}

/// May a cruising torpedo start a dive on `target` now?
pub fn dive_ready(state: &TorpedoState, target: &TargetInfo, y: f32, cfg: &TorpedoConfig) -> bool {
    let horizontal = target.horizontal_distance();
    horizontal <= cfg.dive_range
        && (state.redive_cooldown == 0 || horizontal <= cfg.very_close_distance)
        && y >= cfg.min_y
        && state.action_cooldown == 0
}

/// Should a diving torpedo keep diving on `target`?
pub fn dive_continues(target: &TargetInfo, y: f32, cfg: &TorpedoConfig) -> bool {
    target.horizontal_distance() <= cfg.dive_range * cfg.dive_exit_factor
        && y >= cfg.min_y
        && target.displacement.y <= cfg.dive_abort_height
}

/// Vertical impulse while diving, by priority.
pub fn dive_vertical_impulse(y: f32, dy: f32, cfg: &TorpedoConfig) -> f32 {
    if y < cfg.min_y {
        cfg.strong_correction
    } else if dy < -cfg.deep_dive_distance && y < cfg.min_y + cfg.near_floor_margin {
        cfg.moderate_rise
    } else if dy < -cfg.vertical_deadband {
        let scale = if dy < -cfg.deep_dive_distance {
            cfg.deep_dive_multiplier
        } else {
            1.0
        };
        -cfg.dive_impulse * scale
    } else if dy > cfg.vertical_deadband {
        cfg.rise_impulse * cfg.rise_boost
    } else {
        0.0
    }
}

fn horizontal_dir(displacement: Vec3) -> Vec3 {
    Vec3::new(displacement.x, 0.0, displacement.z).normalize_or_zero()
}

/// Run the torpedo pipeline for one entity.
pub fn run_torpedo(
    ctx: &mut BehaviorContext<'_>,
    actor: &EntitySnapshot,
    cfg: &TorpedoConfig,
    state: &mut TorpedoState,
) -> TorpedoReport {
    let mut report = TorpedoReport {
        mode: state.mode,
        ..Default::default()
    };
    if ctx.ledger.is_detonated(actor.id) {
        // Effects already played; only the removal may still be owed.
        let retry = Outcome::from(ctx.world.remove_entity(actor.id));
        log::debug!("{} detonated earlier, removal retried: {:?}", actor.id, retry);
        report.removal_retry = Some(retry);
        return report;
    }
    let tick = ctx.tick;
    state.tick_cooldowns(ctx.clock.interval() as u32);

    if !state.activation_logged {
        log::info!("Torpedo {} active in {} at {:.0}", actor.id, actor.dimension, actor.position);
        state.activation_logged = true;
    }
    let sound_due = state
        .last_flight_sound_tick
        .map_or(true, |last| tick.saturating_sub(last) >= cfg.flight_sound_interval);
    if sound_due {
        let _ = ctx
            .world
            .play_sound(&actor.dimension, actor.position, FLIGHT_SOUND, 0.6, 1.0);
        state.last_flight_sound_tick = Some(tick);
    }

    let was_diving = state.is_diving();
    report.correction = torpedo_correction(actor.position.y, state, cfg);
    if was_diving && !state.is_diving() {
        report.dive_ended = true;
        trace_ai!(ctx.debug, "torpedo", "dive", "{} climbed back to cruise", actor.id);
    }
    if !report.correction.is_none() {
        trace_ai!(
            ctx.debug,
            "torpedo",
            "altitude",
            "{} at y={:.1} ({:?}), correcting {:?}",
            actor.id,
            actor.position.y,
            state.mode,
            report.correction
        );
        report.moved(ctx.world.apply_impulse(actor.id, report.correction.impulse()).into());
    }

    // Cruising into terrain: chew out before doing anything else.
    if !state.is_diving() && is_embedded(&*ctx.world, actor) {
        let broken = ctx.terrain.scan_and_break(ctx.world, actor, cfg, ctx.ledger);
        report.blocks_broken += broken.broken;
        if broken.detonated {
            report.detonated = true;
            return report;
        }
    }

    let rules = SightRules {
        tolerance: cfg.see_through_tolerance,
        indestructible: ctx.terrain.indestructible(),
    };
    let target = ctx
        .targets
        .find_target(&*ctx.world, ctx.spatial, actor, cfg.target_range, tick, Some(rules));

    match target {
        Some(target) => {
            state.last_seen_tick = Some(tick);
            state.last_target_pos = Some(target.location);
            engage(ctx, actor, cfg, state, &target, &mut report);
        }
        None => {
            if state.is_diving() {
                state.end_dive(cfg);
                report.dive_ended = true;
                trace_ai!(ctx.debug, "torpedo", "dive", "{} lost its target mid-dive", actor.id);
            }
            pursue_memory(ctx, actor, cfg, state, &mut report);
        }
    }
    report.mode = state.mode;
    report
}

fn engage(
    ctx: &mut BehaviorContext<'_>,
    actor: &EntitySnapshot,
    cfg: &TorpedoConfig,
    state: &mut TorpedoState,
    target: &TargetInfo,
    report: &mut TorpedoReport,
) {
    let y = actor.position.y;
    match state.mode {
        DiveMode::Cruise => {
            if !dive_ready(state, target, y, cfg) {
                report.moved(cruise_towards(ctx.world, actor, target.displacement, cfg));
                return;
            }
            let chance = if target.is_player {
                cfg.player_dive_chance
            } else {
                cfg.mob_dive_chance
            };
            if ctx.rng.gen_bool(chance) {
                state.enter_dive(cfg, target.location, ctx.tick);
                report.dive_entered = true;
                trace_ai!(
                    ctx.debug,
                    "torpedo",
                    "dive",
                    "{} diving on {} ({:.1} blocks out)",
                    actor.id,
                    target.target.id(),
                    target.horizontal_distance()
                );
                dive_towards_target(ctx, actor, cfg, state, target, report);
            } else {
                state.action_cooldown = cfg.roll_retry_ticks;
                report.moved(cruise_towards(ctx.world, actor, target.displacement, cfg));
            }
        }
        DiveMode::Dive => {
            if dive_continues(target, y, cfg) {
                dive_towards_target(ctx, actor, cfg, state, target, report);
            } else {
                state.end_dive(cfg);
                report.dive_ended = true;
                trace_ai!(ctx.debug, "torpedo", "dive", "{} breaking off dive", actor.id);
                report.moved(cruise_towards(ctx.world, actor, target.displacement, cfg));
            }
        }
    }
}

/// Powered approach during a dive, tunnelling when the view is blocked.
pub fn dive_towards_target(
    ctx: &mut BehaviorContext<'_>,
    actor: &EntitySnapshot,
    cfg: &TorpedoConfig,
    state: &mut TorpedoState,
    target: &TargetInfo,
    report: &mut TorpedoReport,
) {
    let dir = horizontal_dir(target.displacement);
    if state.backoff_remaining > 0 {
        state.backoff_remaining = state.backoff_remaining.saturating_sub(ctx.clock.interval() as u32);
        let retreat = -dir * cfg.forward_force + Vec3::Y * cfg.moderate_rise;
        report.moved(ctx.world.apply_impulse(actor.id, retreat).into());
        return;
    }

    let rules = SightRules {
        tolerance: cfg.see_through_tolerance,
        indestructible: ctx.terrain.indestructible(),
    };
    let visible = can_see_target_through_blocks(&*ctx.world, &actor.dimension, actor.position, target.location, rules);
    if !visible {
        let broken = ctx.terrain.scan_and_break(ctx.world, actor, cfg, ctx.ledger);
        report.blocks_broken += broken.broken;
        if broken.detonated {
            report.detonated = true;
            return;
        }
        state.tunnel_tally += broken.broken;
        if state.tunnel_tally >= cfg.tunnel_tally_threshold {
            trace_ai!(
                ctx.debug,
                "torpedo",
                "terrain",
                "{} tunnelled {} blocks, backing off",
                actor.id,
                state.tunnel_tally
            );
            state.backoff_remaining = cfg.backoff_ticks;
            state.tunnel_tally = 0;
        }
    }

    let y = actor.position.y;
    let dy = target.displacement.y;
    let horizontal = dir * cfg.forward_force * cfg.dive_speed_multiplier;
    let vertical = dive_vertical_impulse(y, dy, cfg);
    report.moved(ctx.world.apply_impulse(actor.id, horizontal + Vec3::Y * vertical).into());

    if target.horizontal_distance() < cfg.upward_break_horizontal && dy > cfg.upward_break_margin {
        let broken = ctx
            .terrain
            .break_blocks_above(ctx.world, actor, cfg, ctx.ledger, cfg.upward_break_limit);
        report.blocks_broken += broken.broken;
        report.detonated |= broken.detonated;
    }
}

/// Horizontal-only pursuit at cruise speed; altitude is left to the band.
fn cruise_towards(world: &mut dyn WorldAccess, actor: &EntitySnapshot, displacement: Vec3, cfg: &TorpedoConfig) -> Outcome {
    steer_towards(world, actor.id, displacement, cfg.forward_force, 0.0, 0.0)
}

/// No target this pass: head for the remembered spot until the memory goes
/// stale, then forget it and drift.
fn pursue_memory(
    ctx: &mut BehaviorContext<'_>,
    actor: &EntitySnapshot,
    cfg: &TorpedoConfig,
    state: &mut TorpedoState,
    report: &mut TorpedoReport,
) {
    let tick = ctx.tick;
    match (state.last_target_pos, state.last_seen_tick) {
        (Some(remembered), Some(seen)) if tick.saturating_sub(seen) <= cfg.passive_wander_ticks => {
            // Follow a player still standing near the remembered spot.
            let radius_sq = cfg.reacquire_radius * cfg.reacquire_radius;
            let reacquired = ctx
                .spatial
                .player_positions(&actor.dimension)
                .iter()
                .copied()
                .filter(|p| p.distance_squared(remembered) <= radius_sq)
                .min_by(|a, b| {
                    a.distance_squared(remembered)
                        .total_cmp(&b.distance_squared(remembered))
                });
            let goal = reacquired.unwrap_or(remembered);
            state.last_target_pos = Some(goal);
            let offset = goal - actor.position;
            if reacquired.is_none() && Vec3::new(offset.x, 0.0, offset.z).length() < ARRIVAL_DISTANCE {
                drift(ctx, actor, cfg, false, report);
            } else {
                report.moved(cruise_towards(ctx.world, actor, offset, cfg));
            }
        }
        (Some(_), _) | (_, Some(_)) => {
            state.last_target_pos = None;
            state.last_seen_tick = None;
            trace_ai!(ctx.debug, "torpedo", "wander", "{} forgot its target", actor.id);
            drift(ctx, actor, cfg, true, report);
        }
        (None, None) => drift(ctx, actor, cfg, false, report),
    }
}

fn drift(ctx: &mut BehaviorContext<'_>, actor: &EntitySnapshot, cfg: &TorpedoConfig, force: bool, report: &mut TorpedoReport) {
    let outcome = apply_drift(
        ctx.world,
        actor.id,
        ctx.clock,
        ctx.tick,
        cfg.drift_interval,
        cfg.forward_force,
        ctx.rng,
        force,
    );
    if let Some(outcome) = outcome {
        report.moved(outcome);
    }
}

/// True if the torpedo's own cell or the one above it is solid.
fn is_embedded(world: &dyn WorldAccess, actor: &EntitySnapshot) -> bool {
    let cell = actor.block_pos();
    [cell, cell + IVec3::Y]
        .into_iter()
        .any(|c| world.block(&actor.dimension, c).is_ok_and(|b| b.is_solid()))
}
