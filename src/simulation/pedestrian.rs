//! Pedestrian behaviour: patrol, speed boost and death
//!
//! Pedestrians wander between randomly picked waypoints. Damage or nearby
//! gunfire makes them run for a while; enough damage, or being hit by a fast
//! vehicle, turns them into a ragdoll for good.

use glam::Vec3;
use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::collaborators::{Navigation, Presentation};
use super::config::PedestrianConfig;
use super::rig::{Rig, ROOT};
use super::types::{ActorId, BodyId, Layer, PedestrianId, SurfaceArea};
use super::vehicle::DriverActor;

/// Observable behaviour state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedestrianState {
    Patrol,
    /// Running at boosted speed with no idle pauses
    Boosted,
    Dead,
}

/// Where the patrol loop currently is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatrolPhase {
    PickTarget,
    Moving,
    Idle { until: f32 },
}

#[derive(Debug, Clone)]
pub struct PedestrianAgent {
    pub id: PedestrianId,
    pub actor: ActorId,
    pub variant: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    health: i32,
    dead: bool,
    boost_until: Option<f32>,
    speed: f32,
    idle_duration: f32,
    phase: PatrolPhase,
    destination: Option<Vec3>,
    /// Remaining corners towards `destination`
    route: Vec<Vec3>,
    nav_enabled: bool,
    rig: Rig,
}

impl PedestrianAgent {
    pub fn new(
        id: PedestrianId,
        actor: ActorId,
        variant: usize,
        position: Vec3,
        config: &PedestrianConfig,
    ) -> Self {
        Self {
            id,
            actor,
            variant,
            position,
            velocity: Vec3::ZERO,
            health: config.health,
            dead: false,
            boost_until: None,
            speed: config.default_speed,
            idle_duration: config.idle_duration,
            phase: PatrolPhase::PickTarget,
            destination: None,
            route: Vec::new(),
            nav_enabled: true,
            rig: Rig::humanoid(Layer::Npc),
        }
    }

    /// Turn a driver thrown out of its seat into a pedestrian that starts
    /// patrolling straight away, already running
    pub fn from_driver(
        id: PedestrianId,
        mut driver: DriverActor,
        config: &PedestrianConfig,
        now: f32,
    ) -> Self {
        driver.rig.set_colliders_enabled(true);
        let mut pedestrian = Self::new(id, driver.actor, driver.variant, driver.pose.position, config);
        pedestrian.rig = driver.rig;
        pedestrian.start_boost(now, config);
        pedestrian
    }

    pub fn state(&self) -> PedestrianState {
        if self.dead {
            PedestrianState::Dead
        } else if self.boost_until.is_some() {
            PedestrianState::Boosted
        } else {
            PedestrianState::Patrol
        }
    }

    pub fn body_id(&self) -> BodyId {
        BodyId::Pedestrian(self.id)
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Current movement speed
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn idle_duration(&self) -> f32 {
        self.idle_duration
    }

    /// When the running boost ends, if one is active
    pub fn boost_until(&self) -> Option<f32> {
        self.boost_until
    }

    pub fn phase(&self) -> PatrolPhase {
        self.phase
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn nav_enabled(&self) -> bool {
        self.nav_enabled
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn layer(&self) -> Layer {
        self.rig.root().layer
    }

    /// Whether the primary collision volume is live
    pub fn collider_enabled(&self) -> bool {
        self.rig.root().collider_enabled
    }

    /// Apply damage: lose health, start (or restart) running, then check for
    /// death. Returns true if this call killed the pedestrian. Negative
    /// amounts count as zero; health never goes up.
    pub fn take_damage(&mut self, amount: i32, now: f32, config: &PedestrianConfig) -> bool {
        if self.dead {
            return false;
        }
        self.health = self.health.saturating_sub(amount.max(0));
        self.start_boost(now, config);
        if self.health <= 0 {
            self.die();
            return true;
        }
        false
    }

    /// React to a gunshot at `origin` if it is within hearing range
    pub fn on_heard_shooting(&mut self, origin: Vec3, now: f32, config: &PedestrianConfig) {
        if self.dead {
            return;
        }
        if self.position.distance(origin) <= config.hearing_range {
            self.start_boost(now, config);
        }
    }

    /// A vehicle touched us. Above the lethal speed this kills outright,
    /// bypassing the health counter. Returns true if it killed.
    pub fn on_vehicle_contact(&mut self, vehicle_speed: f32, config: &PedestrianConfig) -> bool {
        if self.dead || vehicle_speed <= config.lethal_vehicle_speed {
            return false;
        }
        self.die();
        true
    }

    /// Restart the boost window. Speed is set, never scaled, so repeated
    /// triggers only move the deadline.
    fn start_boost(&mut self, now: f32, config: &PedestrianConfig) {
        self.boost_until = Some(now + config.boost_duration);
        self.speed = config.boosted_speed;
        self.idle_duration = 0.0;
    }

    fn end_boost(&mut self, config: &PedestrianConfig) {
        self.boost_until = None;
        self.speed = config.default_speed;
        self.idle_duration = config.idle_duration;
    }

    fn die(&mut self) {
        debug!("Pedestrian {:?} died", self.id);
        self.dead = true;
        self.health = 0;
        self.nav_enabled = false;
        self.destination = None;
        self.route.clear();
        self.velocity = Vec3::ZERO;

        let root = self.rig.root_mut();
        root.collider_enabled = false;
        root.dynamic = true;
        self.rig.activate_ragdoll();
        self.rig.set_layer_recursive(ROOT, Layer::Dead);
    }

    /// Advance the patrol loop and movement by one tick
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        delta_secs: f32,
        now: f32,
        waypoints: &[Vec3],
        config: &PedestrianConfig,
        navigation: &dyn Navigation,
        presentation: &mut dyn Presentation,
        rng: &mut impl Rng,
    ) {
        if self.dead {
            return;
        }

        if let Some(until) = self.boost_until {
            if now >= until {
                self.end_boost(config);
            }
        }

        self.step_off_road(config, navigation);
        self.advance_patrol(now, waypoints, navigation, rng);
        self.follow_route(delta_secs, config);

        presentation.set_float(self.actor, "speed", self.velocity.length());
    }

    fn step_off_road(&mut self, config: &PedestrianConfig, navigation: &dyn Navigation) {
        if navigation.area_at(self.position, config.surface_probe_radius) != Some(SurfaceArea::Road) {
            return;
        }
        if let Some(hit) = navigation.sample_position(
            self.position,
            config.road_escape_radius,
            Some(SurfaceArea::Walkable),
        ) {
            self.set_destination(hit.position, navigation);
        }
    }

    fn advance_patrol(
        &mut self,
        now: f32,
        waypoints: &[Vec3],
        navigation: &dyn Navigation,
        rng: &mut impl Rng,
    ) {
        if let PatrolPhase::Idle { until } = self.phase {
            if now < until {
                return;
            }
            self.phase = PatrolPhase::PickTarget;
        }

        match self.phase {
            PatrolPhase::PickTarget => match waypoints.choose(rng) {
                Some(&target) => {
                    if !self.set_destination(target, navigation) {
                        self.phase = PatrolPhase::Idle {
                            until: now + self.idle_duration,
                        };
                    }
                }
                None => {
                    self.phase = PatrolPhase::Idle {
                        until: now + self.idle_duration,
                    };
                }
            },
            PatrolPhase::Moving => {
                if self.route.is_empty() {
                    self.destination = None;
                    self.phase = PatrolPhase::Idle {
                        until: now + self.idle_duration,
                    };
                }
            }
            PatrolPhase::Idle { .. } => {}
        }
    }

    /// Ask navigation for a route. Returns false when no route exists.
    fn set_destination(&mut self, target: Vec3, navigation: &dyn Navigation) -> bool {
        if !self.nav_enabled {
            return false;
        }
        match navigation.find_path(self.position, target) {
            Some(route) => {
                self.route = route;
                self.destination = Some(target);
                self.phase = PatrolPhase::Moving;
                true
            }
            None => {
                debug!("Pedestrian {:?}: no route to {:?}", self.id, target);
                false
            }
        }
    }

    fn follow_route(&mut self, delta_secs: f32, config: &PedestrianConfig) {
        let start = self.position;
        let mut budget = self.speed * delta_secs;

        while budget > 0.0 {
            let Some(&corner) = self.route.first() else {
                break;
            };
            let to_corner = corner - self.position;
            let distance = to_corner.length();
            if distance <= budget {
                self.position = corner;
                budget -= distance;
                self.route.remove(0);
            } else {
                self.position += to_corner / distance * budget;
                budget = 0.0;
            }
        }

        if let Some(destination) = self.destination {
            if self.position.distance(destination) <= config.stopping_distance {
                self.route.clear();
            }
        }

        self.velocity = if delta_secs > 0.0 {
            (self.position - start) / delta_secs
        } else {
            Vec3::ZERO
        };
    }
}
