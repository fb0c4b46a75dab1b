//! Skyraid - headless aerial creature simulation on generated voxel terrain.
//!
//! Generates a world, places players and creatures, then drives the aerial AI
//! scheduler and the world's integration step tick by tick, logging periodic
//! summaries. Usage: `skyraid [config.ron]`.

mod config;

use aerial_ai::{AerialScheduler, CreatureKind, TickReport};
use anyhow::{ensure, Result};
use config::SimConfig;
use engine_core::{DimensionId, EntityId};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use voxel::{SimWorld, TerrainGenerator};

/// Flyers start this far above the surface.
const FLYER_SPAWN_HEIGHT: f32 = 18.0;

/// Running totals over all scheduler passes.
#[derive(Debug, Default)]
struct Totals {
    passes: u64,
    processed: u64,
    culled: u64,
    blocks_broken: u64,
    detonations: u64,
    dives: u64,
    dive_exits: u64,
    pruned: u64,
}

impl Totals {
    fn add(&mut self, report: &TickReport) {
        self.passes += 1;
        self.processed += u64::from(report.processed);
        self.culled += u64::from(report.culled);
        self.blocks_broken += u64::from(report.blocks_broken);
        self.detonations += u64::from(report.detonations);
        self.dives += u64::from(report.dives_started);
        self.dive_exits += u64::from(report.dives_ended);
        self.pruned += report.pruned as u64;
    }
}

fn spawn_world(config: &SimConfig) -> (SimWorld, Vec<EntityId>) {
    let mut world = SimWorld::new();
    let generator = TerrainGenerator::new(config.terrain.clone());
    let overworld = DimensionId::overworld();
    generator.generate(&mut world, &overworld);

    for player in &config.players {
        let y = generator.surface_y(player.x as i32, player.z as i32) as f32 + 1.0;
        world.spawn_player(
            &player.name,
            &player.dimension,
            Vec3::new(player.x, y, player.z),
            player.game_mode,
        );
        log::info!("Player {} ({:?}) joined {}", player.name, player.game_mode, player.dimension);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut creatures = Vec::new();
    let spread = config.spawn_radius.max(1.0);
    for spec in &config.ai.creatures {
        let count = match spec.kind {
            CreatureKind::Flying(_) => config.flyers_per_type,
            CreatureKind::Torpedo(_) => config.torpedoes_per_type,
        };
        for _ in 0..count {
            let x = rng.gen_range(-spread..spread);
            let z = rng.gen_range(-spread..spread);
            let y = match spec.kind {
                CreatureKind::Flying(_) => generator.surface_y(x as i32, z as i32) as f32 + FLYER_SPAWN_HEIGHT,
                CreatureKind::Torpedo(t) => (t.cruise_min + t.cruise_max) * 0.5,
            };
            let id = world.spawn_creature(&spec.type_id, "monster", &overworld, Vec3::new(x, y, z));
            creatures.push(id);
        }
        log::info!("Spawned {} x {}", count, spec.type_id);
    }

    // Some livestock for the flyers to harass.
    for i in 0..4 {
        let x = -10.0 + i as f32 * 6.0;
        let z = 15.0;
        let y = generator.surface_y(x as i32, z as i32) as f32 + 1.0;
        world.spawn_creature("cow", "animal", &overworld, Vec3::new(x, y, z));
    }

    (world, creatures)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load_from(&PathBuf::from(path))?,
        None => SimConfig::load(),
    };
    ensure!(config.ai.scheduler.interval > 0, "scheduler interval must be positive");
    ensure!(config.report_every > 0, "report_every must be positive");

    log::info!(
        "Starting skyraid: seed {}, {} ticks, {} players",
        config.seed,
        config.ticks,
        config.players.len()
    );

    let (mut world, creatures) = spawn_world(&config);
    let mut scheduler = AerialScheduler::with_seed(config.ai.clone(), config.seed);
    let mut totals = Totals::default();

    for tick in 0..config.ticks {
        if let Some(report) = scheduler.tick(&mut world, tick) {
            totals.add(&report);
        }
        world.step();

        if tick > 0 && tick % config.report_every == 0 {
            let alive = creatures.iter().filter(|id| world.contains(**id)).count();
            log::info!(
                "tick {}: {} creatures alive, {} tracked, {} blocks broken, {} dives ({} ended), {} detonations",
                tick,
                alive,
                scheduler.tracked_count(),
                totals.blocks_broken,
                totals.dives,
                totals.dive_exits,
                totals.detonations
            );
        }
    }

    let journal = world.journal();
    log::info!(
        "Finished {} passes: {} entity updates, {} culled, {} pruned, {} blocks changed, {} sounds, {} removed",
        totals.passes,
        totals.processed,
        totals.culled,
        totals.pruned,
        journal.blocks_changed,
        journal.sounds.len(),
        journal.removed.len()
    );
    scheduler.shutdown();
    Ok(())
}
