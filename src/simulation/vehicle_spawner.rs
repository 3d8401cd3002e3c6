//! Vehicle spawning and despawning around the player
//!
//! Every waypoint on the loop is a spawn slot. A slot gets a vehicle when
//! the player is inside its distance band and nothing is parked on it; the
//! vehicle goes away again once it ends up beyond the outer edge of the band.

use glam::Vec3;
use log::{debug, info};
use ordered_float::OrderedFloat;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

use super::collaborators::{LayerMask, Physics, QueryFilter};
use super::config::{VehicleConfig, VehicleSpawnConfig};
use super::path::WaypointPath;
use super::types::{ActorId, BodyId, IdGenerator, Layer, Pose, VehicleId};
use super::vehicle::{DriverActor, SeatMarkers, VehicleAgent};

/// Number of distinct driver appearances
pub const DRIVER_VARIANTS: usize = 4;

/// Height of a vehicle's collider centre above its position
pub const VEHICLE_PROXY_HEIGHT: f32 = 0.5;

/// Slot → vehicle binding. The only record of whether a slot is occupied.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    bindings: HashMap<usize, VehicleId>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a vehicle to a free slot. Returns false if the slot is taken.
    pub fn insert(&mut self, slot: usize, vehicle: VehicleId) -> bool {
        if self.bindings.contains_key(&slot) {
            return false;
        }
        self.bindings.insert(slot, vehicle);
        true
    }

    pub fn remove(&mut self, slot: usize) -> Option<VehicleId> {
        self.bindings.remove(&slot)
    }

    pub fn lookup(&self, slot: usize) -> Option<VehicleId> {
        self.bindings.get(&slot).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug)]
struct TrackedVehicle {
    slot: usize,
    agent: VehicleAgent,
}

/// What a scan changed
#[derive(Debug, Default, Clone)]
pub struct VehicleScanReport {
    pub spawned: Vec<VehicleId>,
    pub despawned: Vec<VehicleId>,
}

/// Sole owner of the live vehicles and of the slot bindings
#[derive(Debug)]
pub struct VehicleSpawner {
    config: VehicleSpawnConfig,
    registry: SlotRegistry,
    vehicles: BTreeMap<VehicleId, TrackedVehicle>,
    pub total_spawned: usize,
    pub total_despawned: usize,
}

impl VehicleSpawner {
    pub fn new(config: VehicleSpawnConfig) -> Self {
        Self {
            config,
            registry: SlotRegistry::new(),
            vehicles: BTreeMap::new(),
            total_spawned: 0,
            total_despawned: 0,
        }
    }

    pub fn config(&self) -> &VehicleSpawnConfig {
        &self.config
    }

    /// Whether `distance_sq` from the player lies inside the spawn band
    pub fn in_spawn_band(&self, distance_sq: f32) -> bool {
        distance_sq >= self.config.min_distance_sq() && distance_sq <= self.config.max_distance_sq()
    }

    /// Spawn into every eligible slot, then remove every vehicle that is
    /// out of range
    pub fn scan(
        &mut self,
        player: Vec3,
        path: &WaypointPath,
        vehicle_config: &VehicleConfig,
        physics: &mut dyn Physics,
        ids: &mut IdGenerator,
        rng: &mut impl Rng,
    ) -> VehicleScanReport {
        let mut report = VehicleScanReport::default();

        for slot in 0..path.len() {
            if self.vehicles.len() >= self.config.max_vehicles {
                break;
            }
            if self.registry.lookup(slot).is_some() {
                continue;
            }
            let distance_sq = path.node(slot).distance_squared(player);
            if !self.in_spawn_band(distance_sq) {
                continue;
            }
            if self.slot_blocked(path.node(slot), physics) {
                debug!("Slot {} blocked, skipping spawn", slot);
                continue;
            }
            let id = self.spawn_at_slot(slot, path, vehicle_config, physics, ids, rng);
            report.spawned.push(id);
        }

        report.despawned = self.despawn_out_of_range(player, physics);
        report
    }

    fn slot_blocked(&self, position: Vec3, physics: &dyn Physics) -> bool {
        let filter = QueryFilter::new(LayerMask::only(Layer::Vehicle));
        !physics
            .overlap_sphere(
                position + Vec3::Y * VEHICLE_PROXY_HEIGHT,
                self.config.blocking_radius,
                &filter,
            )
            .is_empty()
    }

    /// Place a vehicle on `slot`, facing and heading for the next node, with
    /// a freshly created AI driver. The slot must be free.
    pub fn spawn_at_slot(
        &mut self,
        slot: usize,
        path: &WaypointPath,
        vehicle_config: &VehicleConfig,
        physics: &mut dyn Physics,
        ids: &mut IdGenerator,
        rng: &mut impl Rng,
    ) -> VehicleId {
        let id = VehicleId(ids.next_id());
        let next = path.next_index(slot);
        let pose = Pose::looking_at(path.node(slot), path.node(next));

        let driver = DriverActor::new(ActorId(ids.next_id()), rng.random_range(0..DRIVER_VARIANTS), pose);
        let agent = VehicleAgent::new(
            id,
            ActorId(ids.next_id()),
            pose,
            next,
            vehicle_config,
            driver,
            SeatMarkers::sedan(),
        );
        self.insert(slot, agent, physics);
        id
    }

    /// Track an already built vehicle on a free slot. Returns false, and
    /// drops nothing, if the slot is taken.
    pub fn insert(&mut self, slot: usize, agent: VehicleAgent, physics: &mut dyn Physics) -> bool {
        if !self.registry.insert(slot, agent.id) {
            return false;
        }
        info!("Spawned vehicle {:?} at slot {}", agent.id, slot);
        physics.sync_body(
            agent.body_id(),
            agent.position() + Vec3::Y * VEHICLE_PROXY_HEIGHT,
            self.config.body_radius,
            Layer::Vehicle,
        );
        self.vehicles.insert(agent.id, TrackedVehicle { slot, agent });
        self.total_spawned += 1;
        true
    }

    /// Remove every vehicle beyond the band's outer edge, together with its
    /// driver. Removals are collected first and applied afterwards.
    fn despawn_out_of_range(&mut self, player: Vec3, physics: &mut dyn Physics) -> Vec<VehicleId> {
        let max_distance_sq = self.config.max_distance_sq();
        let to_remove: Vec<VehicleId> = self
            .vehicles
            .values()
            .filter(|tracked| tracked.agent.position().distance_squared(player) > max_distance_sq)
            .map(|tracked| tracked.agent.id)
            .collect();

        for id in &to_remove {
            self.despawn(*id, physics);
        }
        to_remove
    }

    /// Destroy a vehicle and whatever driver is still in it
    pub fn despawn(&mut self, id: VehicleId, physics: &mut dyn Physics) -> bool {
        let Some(tracked) = self.vehicles.remove(&id) else {
            return false;
        };
        self.registry.remove(tracked.slot);
        physics.remove_body(BodyId::Vehicle(id));
        self.total_despawned += 1;
        info!(
            "Despawned vehicle {:?} from slot {} (driver aboard: {})",
            id,
            tracked.slot,
            tracked.agent.driver().is_some()
        );
        true
    }

    pub fn get(&self, id: VehicleId) -> Option<&VehicleAgent> {
        self.vehicles.get(&id).map(|tracked| &tracked.agent)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut VehicleAgent> {
        self.vehicles.get_mut(&id).map(|tracked| &mut tracked.agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehicleAgent> {
        self.vehicles.values().map(|tracked| &tracked.agent)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VehicleAgent> {
        self.vehicles.values_mut().map(|tracked| &mut tracked.agent)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Vehicle bound to `slot`, if any
    pub fn vehicle_at_slot(&self, slot: usize) -> Option<VehicleId> {
        self.registry.lookup(slot)
    }

    pub fn slot_of(&self, id: VehicleId) -> Option<usize> {
        self.vehicles.get(&id).map(|tracked| tracked.slot)
    }

    /// Closest vehicle strictly within `range` of `position`
    pub fn nearest_within(&self, position: Vec3, range: f32) -> Option<VehicleId> {
        self.iter()
            .map(|agent| (agent.id, agent.position().distance(position)))
            .filter(|(_, distance)| *distance < range)
            .min_by_key(|(_, distance)| OrderedFloat(*distance))
            .map(|(id, _)| id)
    }
}
