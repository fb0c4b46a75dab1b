//! Flying family: hold an altitude band, chase the nearest target, wander
//! after losing it for long enough.

use crate::altitude::{flyer_correction, ground_height, VerticalCorrection};
use crate::config::{FlightConfig, FlightRole};
use crate::debug::trace_ai;
use crate::outcome::Outcome;
use crate::scheduler::BehaviorContext;
use crate::steering::{apply_drift, ceiling_blocked, ceiling_impulse, steer_towards};
use glam::Vec3;
use voxel::EntitySnapshot;

/// Tracking memory for one flyer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlyerState {
    pub last_seen_tick: Option<u64>,
    pub last_target_pos: Option<Vec3>,
}

impl FlyerState {
    fn forget(&mut self) {
        self.last_seen_tick = None;
        self.last_target_pos = None;
    }
}

/// What one flyer did this pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyerReport {
    pub correction: VerticalCorrection,
    pub pursued: bool,
    /// Tracking was dropped this pass and wandering began.
    pub wander_entered: bool,
    pub drifted: bool,
    pub ceiling: bool,
    /// Worst outcome of the impulses requested this pass, if any were.
    pub motion: Option<Outcome>,
}

impl FlyerReport {
    fn moved(&mut self, outcome: Outcome) {
        self.motion = Outcome::fold(self.motion, outcome);
    }
}

impl Default for FlyerReport {
    fn default() -> Self {
        Self {
            correction: VerticalCorrection::None,
            pursued: false,
            wander_entered: false,
            drifted: false,
            ceiling: false,
            motion: None,
        }
    }
}

/// Run the flyer pipeline for one entity.
pub fn run_flyer(
    ctx: &mut BehaviorContext<'_>,
    actor: &EntitySnapshot,
    cfg: &FlightConfig,
    role: FlightRole,
    state: &mut FlyerState,
) -> FlyerReport {
    let mut report = FlyerReport::default();
    let profile = *cfg.profile(role);
    let tick = ctx.tick;

    let ground = ground_height(
        &*ctx.world,
        &actor.dimension,
        actor.position,
        cfg.ground_probe_depth,
        cfg.ground_fallback_offset,
    );
    report.correction = flyer_correction(actor.position.y, ground, &profile, cfg.altitude_impulse);
    if !report.correction.is_none() {
        trace_ai!(
            ctx.debug,
            "flyer",
            "altitude",
            "{} at {:.1} above ground, correcting {:?}",
            actor.id,
            actor.position.y - ground,
            report.correction
        );
        report.moved(ctx.world.apply_impulse(actor.id, report.correction.impulse()).into());
    }

    if ceiling_blocked(&*ctx.world, actor, cfg.ceiling_probe_height) {
        let push = ceiling_impulse(actor.velocity, cfg.ceiling_push, cfg.ceiling_jitter, ctx.rng);
        report.moved(ctx.world.apply_impulse(actor.id, push).into());
        report.ceiling = true;
    }

    let target = ctx
        .targets
        .find_target(&*ctx.world, ctx.spatial, actor, cfg.target_range, tick, None);

    if let Some(target) = target {
        state.last_seen_tick = Some(tick);
        state.last_target_pos = Some(target.location);
        trace_ai!(
            ctx.debug,
            "flyer",
            "targeting",
            "{} pursuing {} at {:.1} blocks",
            actor.id,
            target.target.id(),
            target.displacement.length()
        );
        let outcome = steer_towards(
            ctx.world,
            actor.id,
            target.displacement,
            profile.horizontal_impulse,
            profile.vertical_impulse,
            cfg.vertical_gain,
        );
        report.moved(outcome);
        report.pursued = true;
        return report;
    }

    match (state.last_seen_tick, state.last_target_pos) {
        (Some(seen), _) if tick.saturating_sub(seen) > cfg.passive_wander_ticks => {
            state.forget();
            trace_ai!(ctx.debug, "flyer", "wander", "{} lost its target, wandering", actor.id);
            if let Some(outcome) = apply_drift(
                ctx.world,
                actor.id,
                ctx.clock,
                tick,
                cfg.drift_interval,
                profile.horizontal_impulse,
                ctx.rng,
                true,
            ) {
                report.moved(outcome);
            }
            report.wander_entered = true;
            report.drifted = true;
        }
        (Some(_), Some(last)) => {
            let outcome = steer_towards(
                ctx.world,
                actor.id,
                last - actor.position,
                profile.horizontal_impulse,
                profile.vertical_impulse,
                cfg.vertical_gain,
            );
            report.moved(outcome);
            report.pursued = true;
        }
        _ => {
            let drift = apply_drift(
                ctx.world,
                actor.id,
                ctx.clock,
                tick,
                cfg.drift_interval,
                profile.horizontal_impulse,
                ctx.rng,
                false,
            );
            if let Some(outcome) = drift {
                report.moved(outcome);
                report.drifted = true;
            }
        }
    }
    report
}
