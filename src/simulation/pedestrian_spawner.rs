//! Pedestrian population around the player
//!
//! An initial burst fills the neighbourhood, then one more pedestrian is
//! attempted every interval while under the cap. Pedestrians that end up
//! too far from the player are removed every tick.

use glam::Vec3;
use log::{debug, info};
use rand::Rng;

use super::collaborators::{Navigation, Physics};
use super::config::{PedestrianConfig, PedestrianSpawnConfig};
use super::pedestrian::PedestrianAgent;
use super::types::{ActorId, BodyId, IdGenerator, PedestrianId, SurfaceArea};

/// Number of distinct pedestrian appearances
pub const PEDESTRIAN_VARIANTS: usize = 6;

/// What a scan changed
#[derive(Debug, Default, Clone)]
pub struct PedestrianScanReport {
    pub spawned: Option<PedestrianId>,
    pub despawned: Vec<PedestrianId>,
}

/// Sole owner of the live pedestrian population
#[derive(Debug)]
pub struct PedestrianSpawner {
    config: PedestrianSpawnConfig,
    pedestrians: Vec<PedestrianAgent>,
    next_spawn_at: f32,
    pub total_spawned: usize,
    pub total_despawned: usize,
}

impl PedestrianSpawner {
    pub fn new(config: PedestrianSpawnConfig) -> Self {
        Self {
            config,
            pedestrians: Vec::new(),
            next_spawn_at: 0.0,
            total_spawned: 0,
            total_despawned: 0,
        }
    }

    pub fn config(&self) -> &PedestrianSpawnConfig {
        &self.config
    }

    /// Spawn the initial crowd close to the player. Returns how many were
    /// placed; failed samples are simply skipped.
    pub fn spawn_initial(
        &mut self,
        player: Vec3,
        pedestrian_config: &PedestrianConfig,
        navigation: &dyn Navigation,
        ids: &mut IdGenerator,
        rng: &mut impl Rng,
    ) -> usize {
        let mut placed = 0;
        for _ in 0..self.config.initial_count {
            let min_distance = self.config.initial_min_distance;
            if let Some(position) = self.sample_spawn_point(player, min_distance, navigation, rng) {
                self.spawn(position, pedestrian_config, ids, rng);
                placed += 1;
            }
        }
        info!("Initial pedestrian burst: {}/{}", placed, self.config.initial_count);
        placed
    }

    /// Periodic spawn attempt plus despawn of distant pedestrians
    #[allow(clippy::too_many_arguments)]
    pub fn scan(
        &mut self,
        now: f32,
        player: Vec3,
        pedestrian_config: &PedestrianConfig,
        navigation: &dyn Navigation,
        physics: &mut dyn Physics,
        ids: &mut IdGenerator,
        rng: &mut impl Rng,
    ) -> PedestrianScanReport {
        let mut report = PedestrianScanReport::default();

        if now >= self.next_spawn_at {
            self.next_spawn_at = now + self.config.spawn_interval;
            if self.pedestrians.len() < self.config.max_count {
                let min_distance = self.config.min_distance;
                match self.sample_spawn_point(player, min_distance, navigation, rng) {
                    Some(position) => {
                        report.spawned = Some(self.spawn(position, pedestrian_config, ids, rng));
                    }
                    None => debug!("No walkable spawn point found this round"),
                }
            }
        }

        report.despawned = self.despawn_distant(player, physics);
        report
    }

    /// Search outward from the player for a walkable point at least
    /// `min_distance` away. Tries a few random directions per radius step.
    pub fn sample_spawn_point(
        &self,
        player: Vec3,
        min_distance: f32,
        navigation: &dyn Navigation,
        rng: &mut impl Rng,
    ) -> Option<Vec3> {
        let steps = self.config.radius_steps.max(1);
        let radius_step = (self.config.spawn_radius - min_distance) / steps as f32;
        let mut radius = min_distance;

        for _ in 0..steps {
            for _ in 0..self.config.attempts_per_step {
                let mut candidate = player + random_in_unit_sphere(rng) * radius;
                candidate.y = player.y;

                let Some(hit) =
                    navigation.sample_position(candidate, self.config.sample_snap_distance, None)
                else {
                    continue;
                };
                if hit.area == SurfaceArea::Walkable && hit.position.distance(player) >= min_distance
                {
                    return Some(hit.position);
                }
            }
            radius += radius_step;
        }
        None
    }

    fn spawn(
        &mut self,
        position: Vec3,
        pedestrian_config: &PedestrianConfig,
        ids: &mut IdGenerator,
        rng: &mut impl Rng,
    ) -> PedestrianId {
        let id = PedestrianId(ids.next_id());
        let actor = ActorId(ids.next_id());
        let variant = rng.random_range(0..PEDESTRIAN_VARIANTS);
        debug!("Spawned pedestrian {:?} at {:?}", id, position);
        self.pedestrians
            .push(PedestrianAgent::new(id, actor, variant, position, pedestrian_config));
        self.total_spawned += 1;
        id
    }

    /// Add a pedestrian created elsewhere, such as a driver thrown out of
    /// a vehicle. Adoption ignores the population cap.
    pub fn adopt(&mut self, pedestrian: PedestrianAgent) {
        info!("Pedestrian {:?} joined the population", pedestrian.id);
        self.pedestrians.push(pedestrian);
        self.total_spawned += 1;
    }

    fn despawn_distant(&mut self, player: Vec3, physics: &mut dyn Physics) -> Vec<PedestrianId> {
        let despawn_distance = self.config.despawn_distance;
        let to_remove: Vec<PedestrianId> = self
            .pedestrians
            .iter()
            .filter(|pedestrian| pedestrian.position.distance(player) > despawn_distance)
            .map(|pedestrian| pedestrian.id)
            .collect();

        if to_remove.is_empty() {
            return to_remove;
        }
        self.pedestrians
            .retain(|pedestrian| !to_remove.contains(&pedestrian.id));
        for id in &to_remove {
            physics.remove_body(BodyId::Pedestrian(*id));
        }
        self.total_despawned += to_remove.len();
        debug!("Despawned {} distant pedestrians", to_remove.len());
        to_remove
    }

    pub fn get(&self, id: PedestrianId) -> Option<&PedestrianAgent> {
        self.pedestrians.iter().find(|pedestrian| pedestrian.id == id)
    }

    pub fn get_mut(&mut self, id: PedestrianId) -> Option<&mut PedestrianAgent> {
        self.pedestrians
            .iter_mut()
            .find(|pedestrian| pedestrian.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PedestrianAgent> {
        self.pedestrians.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PedestrianAgent> {
        self.pedestrians.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.pedestrians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pedestrians.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.pedestrians.iter().filter(|p| !p.is_dead()).count()
    }
}

/// Uniform point inside the unit sphere, by rejection
fn random_in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}
