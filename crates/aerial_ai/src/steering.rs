//! Impulse steering: pursuit, periodic drift and low-ceiling deflection.

use crate::outcome::Outcome;
use engine_core::{EntityId, TickClock};
use glam::{IVec3, Vec3};
use rand::Rng;
use voxel::{EntitySnapshot, WorldAccess};

/// Horizontal thrust toward `displacement` plus a vertical component
/// proportional to the height difference, clamped to `vertical_impulse`.
pub fn steer_impulse(displacement: Vec3, horizontal_impulse: f32, vertical_impulse: f32, vertical_gain: f32) -> Vec3 {
    let horizontal = Vec3::new(displacement.x, 0.0, displacement.z).normalize_or_zero() * horizontal_impulse;
    let vertical = (displacement.y * vertical_gain).clamp(-vertical_impulse, vertical_impulse);
    horizontal + Vec3::Y * vertical
}

/// Apply [`steer_impulse`] to `actor`.
pub fn steer_towards(
    world: &mut dyn WorldAccess,
    actor: EntityId,
    displacement: Vec3,
    horizontal_impulse: f32,
    vertical_impulse: f32,
    vertical_gain: f32,
) -> Outcome {
    let impulse = steer_impulse(displacement, horizontal_impulse, vertical_impulse, vertical_gain);
    world.apply_impulse(actor, impulse).into()
}

/// Random horizontal direction at half the cruise thrust.
pub fn drift_impulse<R: Rng + ?Sized>(rng: &mut R, horizontal_impulse: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    Vec3::new(angle.cos(), 0.0, angle.sin()) * (horizontal_impulse * 0.5)
}

/// Drift on the `interval` cadence only, unless `force` is set. Returns
/// `None` when no drift was due.
#[allow(clippy::too_many_arguments)]
pub fn apply_drift<R: Rng + ?Sized>(
    world: &mut dyn WorldAccess,
    actor: EntityId,
    clock: &TickClock,
    tick: u64,
    interval: u64,
    horizontal_impulse: f32,
    rng: &mut R,
    force: bool,
) -> Option<Outcome> {
    if !force && !clock.is_window_start(tick, interval) {
        return None;
    }
    let impulse = drift_impulse(rng, horizontal_impulse);
    Some(world.apply_impulse(actor, impulse).into())
}

/// True if any of the `height` blocks directly above `actor` is not air.
pub fn ceiling_blocked(world: &dyn WorldAccess, actor: &EntitySnapshot, height: i32) -> bool {
    let head = actor.block_pos();
    (1..=height).any(|dy| {
        world
            .block(&actor.dimension, head + IVec3::new(0, dy, 0))
            .is_ok_and(|block| !block.is_air())
    })
}

/// Push down hard enough to cancel any climb, with a little sideways jitter.
pub fn ceiling_impulse<R: Rng + ?Sized>(velocity: Vec3, push: f32, jitter: f32, rng: &mut R) -> Vec3 {
    let jx = rng.gen_range(-jitter..=jitter);
    let jz = rng.gen_range(-jitter..=jitter);
    Vec3::new(jx, -velocity.y.max(0.0) - push, jz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{DimensionId, GameMode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use voxel::{BlockId, SimWorld};

    #[test]
    fn steering_splits_horizontal_and_clamped_vertical() {
        let impulse = steer_impulse(Vec3::new(3.0, 100.0, 4.0), 0.1, 0.05, 0.05);
        assert!((impulse.x - 0.06).abs() < 1e-6);
        assert!((impulse.z - 0.08).abs() < 1e-6);
        assert_eq!(impulse.y, 0.05);

        let gentle = steer_impulse(Vec3::new(0.0, -0.5, 0.0), 0.1, 0.05, 0.05);
        assert_eq!(gentle.x, 0.0);
        assert!((gentle.y + 0.025).abs() < 1e-6);
    }

    #[test]
    fn drift_is_half_thrust_and_on_cadence() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = drift_impulse(&mut rng, 0.08);
        assert!((d.length() - 0.04).abs() < 1e-5);
        assert_eq!(d.y, 0.0);

        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        let id = world.spawn_creature("phantom", "monster", &dim, Vec3::ZERO);
        let clock = TickClock::new(5);
        assert!(apply_drift(&mut world, id, &clock, 40, 40, 0.08, &mut rng, false).is_some());
        assert!(apply_drift(&mut world, id, &clock, 45, 40, 0.08, &mut rng, false).is_none());
        assert!(apply_drift(&mut world, id, &clock, 45, 40, 0.08, &mut rng, true).is_some());
        assert_eq!(world.journal().impulses_for(id).count(), 2);
    }

    #[test]
    fn ceiling_probe_and_push() {
        let mut world = SimWorld::new();
        let dim = DimensionId::overworld();
        let id = world.spawn_creature("phantom", "monster", &dim, Vec3::new(0.5, 10.5, 0.5));
        world.spawn_player("p", &dim, Vec3::ZERO, GameMode::Survival);
        let snap = world.entity(id).unwrap();
        assert!(!ceiling_blocked(&world, &snap, 3));
        world.put_block(&dim, IVec3::new(0, 13, 0), BlockId::Stone);
        assert!(ceiling_blocked(&world, &snap, 3));

        let mut rng = StdRng::seed_from_u64(1);
        let push = ceiling_impulse(Vec3::new(0.0, 0.3, 0.0), 0.1, 0.05, &mut rng);
        assert!((push.y + 0.4).abs() < 1e-6);
        assert!(push.x.abs() <= 0.05 && push.z.abs() <= 0.05);
    }
}
