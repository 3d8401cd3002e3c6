//! Main simulation world that ties everything together
//!
//! `SimWorld` owns every agent, both spawners, the possession controller and
//! the engine collaborators, and advances them in a fixed order each tick.
//! It runs headless against the sandbox collaborators.

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::collaborators::{Navigation, Physics, Presentation};
use super::config::SimConfig;
use super::input::InputFrame;
use super::path::WaypointPath;
use super::pedestrian::PedestrianAgent;
use super::pedestrian_spawner::PedestrianSpawner;
use super::player::{PlayerCharacter, PLAYER_RADIUS};
use super::possession::{InteractOutcome, PossessionContext, PossessionController};
use super::sandbox::{SandboxNavigation, SandboxPhysics, SandboxPresentation};
use super::types::{ActorId, BodyId, IdGenerator, Layer, PedestrianId, Pose, SurfaceArea};
use super::vehicle_spawner::{VehicleSpawner, VEHICLE_PROXY_HEIGHT};
use super::weapon::Weapon;

/// Height and radius of a character's collider sphere
const CHARACTER_PROXY_HEIGHT: f32 = 0.9;
const PEDESTRIAN_PROXY_RADIUS: f32 = 0.9;

/// Running totals for the summary
#[derive(Debug, Clone, Default)]
pub struct WorldStats {
    pub ticks: u64,
    pub shots_hit: usize,
    pub headshots: usize,
    pub pedestrians_shot_dead: usize,
    pub pedestrians_run_over: usize,
    pub vehicles_entered: usize,
    pub drivers_released: usize,
}

/// The main simulation world
pub struct SimWorld<P: Physics, N: Navigation, R: Presentation> {
    pub config: SimConfig,
    /// Closed loop shared by every vehicle
    pub path: WaypointPath,
    /// Patrol targets shared by every pedestrian
    pub pedestrian_waypoints: Vec<Vec3>,
    pub vehicles: VehicleSpawner,
    pub pedestrians: PedestrianSpawner,
    pub player: PlayerCharacter,
    pub possession: PossessionController,
    pub weapon: Weapon,
    pub physics: P,
    pub navigation: N,
    pub presentation: R,
    ids: IdGenerator,
    rng: StdRng,
    /// Simulation time
    pub time: f32,
    pub stats: WorldStats,
}

/// A world running on the in-memory collaborators
pub type SandboxWorld = SimWorld<SandboxPhysics, SandboxNavigation, SandboxPresentation>;

impl<P: Physics, N: Navigation, R: Presentation> SimWorld<P, N, R> {
    pub fn new(
        config: SimConfig,
        path: WaypointPath,
        physics: P,
        navigation: N,
        presentation: R,
    ) -> Self {
        let mut ids = IdGenerator::new();
        let player = PlayerCharacter::new(ActorId(ids.next_id()), Pose::default());
        Self {
            vehicles: VehicleSpawner::new(config.vehicle_spawn.clone()),
            pedestrians: PedestrianSpawner::new(config.pedestrian_spawn.clone()),
            possession: PossessionController::new(config.possession.clone()),
            config,
            path,
            pedestrian_waypoints: Vec::new(),
            player,
            weapon: Weapon::new(),
            physics,
            navigation,
            presentation,
            ids,
            rng: StdRng::from_rng(&mut rand::rng()),
            time: 0.0,
            stats: WorldStats::default(),
        }
    }

    /// Use a seeded RNG for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_pedestrian_waypoints(mut self, waypoints: Vec<Vec3>) -> Self {
        self.pedestrian_waypoints = waypoints;
        self
    }

    pub fn with_player_pose(mut self, pose: Pose) -> Self {
        self.player.pose = pose;
        self
    }

    /// Place the initial crowd around the player
    pub fn populate(&mut self) -> usize {
        self.pedestrians.spawn_initial(
            self.player.position(),
            &self.config.pedestrian,
            &self.navigation,
            &mut self.ids,
            &mut self.rng,
        )
    }

    /// Advance the world by one tick
    pub fn tick(&mut self, delta_secs: f32, input: &InputFrame) {
        self.time += delta_secs;
        self.stats.ticks += 1;
        let now = self.time;

        self.run_spawners(now);
        self.run_possession(now, input);

        self.player.update(delta_secs, input, &self.config.player);
        if self.player.attack_enabled {
            // The weapon is only raised, and only fires, while aiming
            let aiming = input.aim.is_down();
            self.presentation.set_crosshair_visible(aiming);
            if aiming && input.fire.is_down() {
                self.fire_weapon(now);
            }
        }

        self.update_vehicles(delta_secs, input);
        for pedestrian in self.pedestrians.iter_mut() {
            pedestrian.update(
                delta_secs,
                now,
                &self.pedestrian_waypoints,
                &self.config.pedestrian,
                &self.navigation,
                &mut self.presentation,
                &mut self.rng,
            );
        }

        self.resolve_contacts();
        self.sync_physics();
        self.presentation.advance(delta_secs);
    }

    fn run_spawners(&mut self, now: f32) {
        let player = self.player.position();
        let vehicles = self.vehicles.scan(
            player,
            &self.path,
            &self.config.vehicle,
            &mut self.physics,
            &mut self.ids,
            &mut self.rng,
        );
        let pedestrians = self.pedestrians.scan(
            now,
            player,
            &self.config.pedestrian,
            &self.navigation,
            &mut self.physics,
            &mut self.ids,
            &mut self.rng,
        );
        if !vehicles.spawned.is_empty() || !vehicles.despawned.is_empty() {
            debug!(
                "Vehicle scan: +{} -{}",
                vehicles.spawned.len(),
                vehicles.despawned.len()
            );
        }
        if !pedestrians.despawned.is_empty() {
            debug!("Pedestrian scan: -{}", pedestrians.despawned.len());
        }
    }

    fn run_possession(&mut self, now: f32, input: &InputFrame) {
        let mut ctx = PossessionContext {
            now,
            vehicles: &mut self.vehicles,
            player: &mut self.player,
            presentation: &mut self.presentation,
        };
        if input.interact.pressed() {
            let outcome = self.possession.interact(&mut ctx);
            if let InteractOutcome::Entering(_) = outcome {
                self.stats.vehicles_entered += 1;
            }
        }
        let released = self.possession.tick(&mut ctx);

        for driver in released {
            let id = PedestrianId(self.ids.next_id());
            let pedestrian = PedestrianAgent::from_driver(id, driver, &self.config.pedestrian, now);
            self.pedestrians.adopt(pedestrian);
            self.stats.drivers_released += 1;
        }
    }

    /// Pull the trigger. Hits deal head or body damage depending on where the
    /// round landed; every shot alerts the pedestrians around the shooter.
    fn fire_weapon(&mut self, now: f32) {
        let muzzle = Pose::new(
            self.player.position() + Vec3::Y * self.config.weapon.muzzle_height,
            self.player.pose.rotation,
        );
        let Some(shot) = self
            .weapon
            .try_fire(now, muzzle, &self.config.weapon, &self.physics)
        else {
            return;
        };

        let pedestrian_config = &self.config.pedestrian;
        if let Some(hit) = shot.hit {
            if let Some(pedestrian) = self.pedestrians.get_mut(hit.pedestrian) {
                let headshot = hit.point.y - pedestrian.position.y >= pedestrian_config.head_height;
                let damage = if headshot {
                    self.stats.headshots += 1;
                    self.config.weapon.head_damage
                } else {
                    self.config.weapon.body_damage
                };
                self.stats.shots_hit += 1;
                if pedestrian.take_damage(damage, now, pedestrian_config) {
                    self.presentation.set_animator_enabled(pedestrian.actor, false);
                    self.stats.pedestrians_shot_dead += 1;
                    info!("Pedestrian {:?} was shot dead", pedestrian.id);
                }
            }
        }

        let alert_radius = self.config.weapon.alert_radius;
        for pedestrian in self.pedestrians.iter_mut() {
            if pedestrian.position.distance(shot.origin) <= alert_radius {
                pedestrian.on_heard_shooting(shot.origin, now, pedestrian_config);
            }
        }
    }

    fn update_vehicles(&mut self, delta_secs: f32, input: &InputFrame) {
        let driving = self.possession.driving_vehicle();
        for vehicle in self.vehicles.iter_mut() {
            let vehicle_input = (driving == Some(vehicle.id)).then_some(input);
            vehicle.update(
                delta_secs,
                &self.path,
                &self.config.vehicle,
                &self.config.player_drive,
                vehicle_input,
                &self.physics,
            );
        }
    }

    /// Kill any live pedestrian touched by a vehicle moving fast enough
    fn resolve_contacts(&mut self) {
        let pedestrian_config = &self.config.pedestrian;
        let contact_distance = self.config.vehicle_spawn.body_radius + pedestrian_config.body_radius;

        for vehicle in self.vehicles.iter() {
            let speed = vehicle.speed();
            if speed <= pedestrian_config.lethal_vehicle_speed {
                continue;
            }
            for pedestrian in self.pedestrians.iter_mut() {
                if pedestrian.is_dead()
                    || pedestrian.position.distance(vehicle.position()) >= contact_distance
                {
                    continue;
                }
                if pedestrian.on_vehicle_contact(speed, pedestrian_config) {
                    self.presentation.set_animator_enabled(pedestrian.actor, false);
                    self.stats.pedestrians_run_over += 1;
                    info!(
                        "Pedestrian {:?} run over by vehicle {:?} at {:.1} m/s",
                        pedestrian.id, vehicle.id, speed
                    );
                }
            }
        }
    }

    /// Move every collider proxy to where its owner ended up this tick
    fn sync_physics(&mut self) {
        let vehicle_radius = self.config.vehicle_spawn.body_radius;
        for vehicle in self.vehicles.iter() {
            self.physics.sync_body(
                vehicle.body_id(),
                vehicle.position() + Vec3::Y * VEHICLE_PROXY_HEIGHT,
                vehicle_radius,
                Layer::Vehicle,
            );
        }
        for pedestrian in self.pedestrians.iter() {
            self.physics.sync_body(
                pedestrian.body_id(),
                pedestrian.position + Vec3::Y * CHARACTER_PROXY_HEIGHT,
                PEDESTRIAN_PROXY_RADIUS,
                pedestrian.layer(),
            );
        }
        if self.player.collider_enabled {
            self.physics.sync_body(
                BodyId::Player,
                self.player.position() + Vec3::Y * CHARACTER_PROXY_HEIGHT,
                PLAYER_RADIUS,
                Layer::Player,
            );
        } else {
            self.physics.remove_body(BodyId::Player);
        }
    }

    /// Print a summary of the current state
    pub fn print_summary(&self) {
        println!("=== Street Simulation Summary ===");
        println!("Time: {:.2}s ({} ticks)", self.time, self.stats.ticks);
        let position = self.player.position();
        println!(
            "Player: ({:.1}, {:.1}, {:.1}) {:?}",
            position.x,
            position.y,
            position.z,
            self.possession.state()
        );
        println!(
            "Vehicles: {} (spawned {}, despawned {})",
            self.vehicles.len(),
            self.vehicles.total_spawned,
            self.vehicles.total_despawned
        );
        println!(
            "Pedestrians: {} alive / {} (spawned {}, despawned {})",
            self.pedestrians.alive_count(),
            self.pedestrians.len(),
            self.pedestrians.total_spawned,
            self.pedestrians.total_despawned
        );
        println!(
            "Weapon: {} shots, {} hits ({} headshots)",
            self.weapon.shots_fired, self.stats.shots_hit, self.stats.headshots
        );
        println!(
            "Casualties: {} shot, {} run over",
            self.stats.pedestrians_shot_dead, self.stats.pedestrians_run_over
        );
        println!(
            "Possession: {} entered, {} drivers ejected, {} released",
            self.stats.vehicles_entered,
            self.possession.drivers_ejected,
            self.stats.drivers_released
        );

        if !self.vehicles.is_empty() {
            println!("--- Vehicles ---");
            for vehicle in self.vehicles.iter() {
                let position = vehicle.position();
                println!(
                    "  Vehicle {:?}: pos=({:.1}, {:.1}) node={} speed={:.1}km/h {:?}{}{}",
                    vehicle.id.0 .0,
                    position.x,
                    position.z,
                    vehicle.current_node,
                    vehicle.body.speed_kmh(),
                    vehicle.mode(),
                    if vehicle.braking { " braking" } else { "" },
                    if vehicle.driver().is_none() { " (no driver)" } else { "" },
                );
            }
        }
    }
}

impl SandboxWorld {
    /// A world on fresh sandbox collaborators, with the player's animator
    /// wired to its configured walk state
    pub fn sandbox(config: SimConfig, path: WaypointPath, navigation: SandboxNavigation) -> Self {
        let mut world = SimWorld::new(
            config,
            path,
            SandboxPhysics::new(),
            navigation,
            SandboxPresentation::new(),
        );
        let walk_state = world.config.possession.player_walk_state.clone();
        world
            .presentation
            .set_walk_state(world.player.actor, &walk_state);
        world
    }

    /// Square road loop around a plaza, with a sidewalk ring outside it.
    /// The player starts in the plaza near the southern road.
    pub fn create_demo_world(seed: u64, initial_pedestrians: usize) -> Result<Self> {
        const HALF: f32 = 60.0;
        const NODE_SPACING: f32 = 15.0;
        const ROAD_HALF_WIDTH: f32 = 4.0;
        const OUTER: f32 = 100.0;

        let path = WaypointPath::new(square_loop(HALF, NODE_SPACING))
            .context("Failed to build the demo road loop")?;

        let inner = HALF - ROAD_HALF_WIDTH;
        let outer = HALF + ROAD_HALF_WIDTH;
        let mut navigation = SandboxNavigation::new();
        // Road bands around the loop
        navigation.add_region(SurfaceArea::Road, Vec2::new(-outer, -outer), Vec2::new(outer, -inner));
        navigation.add_region(SurfaceArea::Road, Vec2::new(-outer, inner), Vec2::new(outer, outer));
        navigation.add_region(SurfaceArea::Road, Vec2::new(-outer, -inner), Vec2::new(-inner, inner));
        navigation.add_region(SurfaceArea::Road, Vec2::new(inner, -inner), Vec2::new(outer, inner));
        // Plaza and outer sidewalk ring
        let plaza = inner - 1.0;
        let ring = outer + 1.0;
        navigation.add_region(SurfaceArea::Walkable, Vec2::splat(-plaza), Vec2::splat(plaza));
        navigation.add_region(SurfaceArea::Walkable, Vec2::new(-OUTER, -OUTER), Vec2::new(OUTER, -ring));
        navigation.add_region(SurfaceArea::Walkable, Vec2::new(-OUTER, ring), Vec2::new(OUTER, OUTER));
        navigation.add_region(SurfaceArea::Walkable, Vec2::new(-OUTER, -ring), Vec2::new(-ring, ring));
        navigation.add_region(SurfaceArea::Walkable, Vec2::new(ring, -ring), Vec2::new(OUTER, ring));

        let mut config = SimConfig::default();
        config.vehicle_spawn.min_distance = 30.0;
        config.vehicle_spawn.max_distance = 150.0;
        config.vehicle_spawn.max_vehicles = 6;
        config.pedestrian_spawn.initial_count = initial_pedestrians;

        let waypoints = vec![
            Vec3::new(-40.0, 0.0, -40.0),
            Vec3::new(40.0, 0.0, -40.0),
            Vec3::new(40.0, 0.0, 40.0),
            Vec3::new(-40.0, 0.0, 40.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(-80.0, 0.0, -80.0),
            Vec3::new(80.0, 0.0, 80.0),
        ];

        let mut world = SandboxWorld::sandbox(config, path, navigation)
            .with_seed(seed)
            .with_pedestrian_waypoints(waypoints)
            .with_player_pose(Pose::from_position(Vec3::new(0.0, 0.0, -40.0)));

        for pole in [
            Vec3::new(-20.0, 1.0, -20.0),
            Vec3::new(20.0, 1.0, -20.0),
            Vec3::new(-20.0, 1.0, 20.0),
            Vec3::new(20.0, 1.0, 20.0),
        ] {
            world.physics.add_static(pole, 0.5);
        }

        let placed = world.populate();
        info!(
            "Demo world ready: {} waypoints, {} pedestrians",
            world.path.len(),
            placed
        );
        Ok(world)
    }
}

/// Nodes every `spacing` units around a square of half-size `half`
fn square_loop(half: f32, spacing: f32) -> Vec<Vec3> {
    let steps = ((2.0 * half) / spacing).round().max(1.0) as usize;
    let step = 2.0 * half / steps as f32;
    let corners = [
        Vec2::new(-half, -half),
        Vec2::new(half, -half),
        Vec2::new(half, half),
        Vec2::new(-half, half),
    ];

    let mut nodes = Vec::with_capacity(steps * corners.len());
    for (index, corner) in corners.iter().enumerate() {
        let next = corners[(index + 1) % corners.len()];
        let direction = (next - *corner).normalize();
        for i in 0..steps {
            let point = *corner + direction * (step * i as f32);
            nodes.push(Vec3::new(point.x, 0.0, point.y));
        }
    }
    nodes
}
