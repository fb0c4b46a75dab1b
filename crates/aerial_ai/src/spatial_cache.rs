//! Shared, time-windowed cache of players and mobs.
//!
//! Whole-world entity queries are the expensive part of a pass. Every consumer
//! in a pass (culling, target resolution, remembered-target checks) reads
//! through this cache, which goes back to the world at most once per window.

use engine_core::{DimensionId, EntityId, Vec3};
use std::collections::HashMap;
use voxel::{EntitySnapshot, PlayerSnapshot, WorldAccess};

#[derive(Debug, Clone)]
struct MobEntry {
    fetched_at: u64,
    mobs: Vec<EntitySnapshot>,
}

/// Players and per-dimension mob lists, each valid for a fixed tick window.
#[derive(Debug)]
pub struct SpatialCache {
    player_window: u64,
    mob_window: u64,
    /// Mob families fetched by the batched query.
    families: Vec<String>,
    players: Vec<PlayerSnapshot>,
    player_positions: HashMap<DimensionId, Vec<Vec3>>,
    players_fetched_at: Option<u64>,
    mobs: HashMap<DimensionId, MobEntry>,
}

fn is_fresh(fetched_at: u64, tick: u64, window: u64) -> bool {
    tick >= fetched_at && tick - fetched_at < window
}

impl SpatialCache {
    pub fn new(player_window: u64, mob_window: u64, families: Vec<String>) -> Self {
        Self {
            player_window: player_window.max(1),
            mob_window: mob_window.max(1),
            families,
            players: Vec::new(),
            player_positions: HashMap::new(),
            players_fetched_at: None,
            mobs: HashMap::new(),
        }
    }

    /// All known players, refreshed from the world if the window has expired.
    /// A failed query yields an empty list.
    pub fn players(&mut self, world: &dyn WorldAccess, tick: u64) -> &[PlayerSnapshot] {
        let fresh = self
            .players_fetched_at
            .is_some_and(|at| is_fresh(at, tick, self.player_window));
        if !fresh {
            self.refresh_players(world, tick);
        }
        &self.players
    }

    fn refresh_players(&mut self, world: &dyn WorldAccess, tick: u64) {
        self.players = match world.players() {
            Ok(players) => players,
            Err(e) => {
                log::debug!("Player query failed, treating as empty: {}", e);
                Vec::new()
            }
        };
        self.player_positions.clear();
        for player in &self.players {
            // DimensionId is canonical already; namespaced host names collapse here.
            self.player_positions
                .entry(player.dimension.clone())
                .or_default()
                .push(player.position);
        }
        self.players_fetched_at = Some(tick);
    }

    /// Positions of every player in `dimension` as of the last refresh.
    pub fn player_positions(&self, dimension: &DimensionId) -> &[Vec3] {
        self.player_positions
            .get(dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cached player by id, if present at the last refresh.
    pub fn player(&self, id: EntityId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Mobs of the tracked families in `dimension`. The per-dimension list is
    /// refreshed at most once per window; `near` filters by distance at read
    /// time whether or not the list was just fetched.
    pub fn mobs(
        &mut self,
        world: &dyn WorldAccess,
        dimension: &DimensionId,
        tick: u64,
        near: Option<(Vec3, f32)>,
    ) -> Vec<EntitySnapshot> {
        let fresh = self
            .mobs
            .get(dimension)
            .is_some_and(|entry| is_fresh(entry.fetched_at, tick, self.mob_window));
        if !fresh {
            let mobs = match world.mobs(dimension, &self.families) {
                Ok(mobs) => mobs,
                Err(e) => {
                    log::debug!("Mob query in {} failed, treating as empty: {}", dimension, e);
                    Vec::new()
                }
            };
            self.mobs.insert(
                dimension.clone(),
                MobEntry {
                    fetched_at: tick,
                    mobs,
                },
            );
        }

        let Some(entry) = self.mobs.get(dimension) else {
            return Vec::new();
        };
        match near {
            Some((center, radius)) => {
                let radius_sq = radius * radius;
                entry
                    .mobs
                    .iter()
                    .filter(|m| m.position.distance_squared(center) <= radius_sq)
                    .cloned()
                    .collect()
            }
            None => entry.mobs.clone(),
        }
    }

    pub fn invalidate_players(&mut self) {
        self.players_fetched_at = None;
    }

    pub fn invalidate_mobs(&mut self) {
        self.mobs.clear();
    }

    /// Drop everything; the next read goes to the world.
    pub fn invalidate(&mut self) {
        self.invalidate_players();
        self.invalidate_mobs();
        self.players.clear();
        self.player_positions.clear();
    }

    /// Forget mob lists for partitions that no longer exist.
    pub fn retain_dimensions(&mut self, dimensions: &[DimensionId]) {
        self.mobs.retain(|dim, _| dimensions.contains(dim));
    }
}
