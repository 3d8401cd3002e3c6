//! Vehicle control for the street simulation
//!
//! A `VehicleAgent` follows the shared waypoint loop with a proportional
//! steering controller, brakes for anything its forward probe finds, and can
//! be handed to the player, who then drives it from input instead.

use glam::{Quat, Vec3};
use log::debug;

use super::body::{Chassis, RigidBody, WheelControls};
use super::collaborators::{LayerMask, Physics, QueryFilter};
use super::config::{PlayerDriveConfig, VehicleConfig};
use super::input::InputFrame;
use super::path::WaypointPath;
use super::rig::Rig;
use super::types::{ActorId, BodyId, Layer, Pose, VehicleId};

/// Weight of the waypoint target when blending it with the on-path projection
const AIM_BLEND: f32 = 0.5;

/// Throttle input below this magnitude counts as coasting
const COAST_INPUT_EPSILON: f32 = 0.01;

/// Character sitting in a vehicle's seat
#[derive(Debug, Clone)]
pub struct DriverActor {
    pub actor: ActorId,
    /// Appearance picked at spawn
    pub variant: usize,
    pub pose: Pose,
    pub rig: Rig,
}

impl DriverActor {
    /// A seated driver has all colliders off so it rides along with the car
    pub fn new(actor: ActorId, variant: usize, pose: Pose) -> Self {
        let mut rig = Rig::humanoid(Layer::Npc);
        rig.set_colliders_enabled(false);
        Self {
            actor,
            variant,
            pose,
            rig,
        }
    }
}

/// Named attachment points on a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Where the player stands while opening the door
    Enter,
    /// The driver's seat
    Driving,
    /// Where the player lands when getting out
    Exit,
    /// Where the player ends up once the exit animation is done
    Out,
    /// Where a displaced AI driver is thrown to
    NpcEject,
}

impl Marker {
    pub fn name(self) -> &'static str {
        match self {
            Marker::Enter => "EnterPosition",
            Marker::Driving => "DrivingPosition",
            Marker::Exit => "ExitPosition",
            Marker::Out => "OutPosition",
            Marker::NpcEject => "EnterPositionNPC",
        }
    }
}

/// Vehicle-local marker poses. Any of them may be missing on a given model.
#[derive(Debug, Clone, Default)]
pub struct SeatMarkers {
    pub enter: Option<Pose>,
    pub driving: Option<Pose>,
    pub exit: Option<Pose>,
    pub out: Option<Pose>,
    pub npc_eject: Option<Pose>,
}

impl SeatMarkers {
    /// Left-hand-drive four-door layout
    pub fn sedan() -> Self {
        let facing = Quat::IDENTITY;
        Self {
            enter: Some(Pose::new(Vec3::new(-1.4, 0.0, 0.3), facing)),
            driving: Some(Pose::new(Vec3::new(-0.4, 0.5, 0.1), facing)),
            exit: Some(Pose::new(Vec3::new(-1.4, 0.0, 0.3), facing)),
            out: Some(Pose::new(Vec3::new(-2.2, 0.0, 0.3), facing)),
            npc_eject: Some(Pose::new(Vec3::new(-1.8, 0.0, -0.6), facing)),
        }
    }

    pub fn get(&self, marker: Marker) -> Option<Pose> {
        match marker {
            Marker::Enter => self.enter,
            Marker::Driving => self.driving,
            Marker::Exit => self.exit,
            Marker::Out => self.out,
            Marker::NpcEject => self.npc_eject,
        }
    }
}

/// Who is steering the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Waypoint following
    Autonomous,
    /// Input-driven, the player is in the seat
    Player,
    /// No controller; left where it stopped
    Parked,
}

#[derive(Debug, Clone)]
pub struct VehicleAgent {
    pub id: VehicleId,
    pub actor: ActorId,
    pub body: RigidBody,
    pub chassis: Chassis,
    /// Index of the waypoint being driven to, always in [0, path.len())
    pub current_node: usize,
    pub braking: bool,
    pub obstacle_detected: bool,
    mode: ControlMode,
    controls: WheelControls,
    driver: Option<DriverActor>,
    markers: SeatMarkers,
}

impl VehicleAgent {
    pub fn new(
        id: VehicleId,
        actor: ActorId,
        pose: Pose,
        current_node: usize,
        config: &VehicleConfig,
        driver: DriverActor,
        markers: SeatMarkers,
    ) -> Self {
        let chassis = Chassis {
            wheelbase: config.wheelbase,
            wheel_radius: config.wheel_radius,
            driven_wheels: config.driven_wheels,
            ..Chassis::default()
        };
        let mut vehicle = Self {
            id,
            actor,
            body: RigidBody::new(pose, config.mass),
            chassis,
            current_node,
            braking: false,
            obstacle_detected: false,
            mode: ControlMode::Autonomous,
            controls: WheelControls::default(),
            driver: Some(driver),
            markers,
        };
        vehicle.pin_driver();
        vehicle
    }

    pub fn body_id(&self) -> BodyId {
        BodyId::Vehicle(self.id)
    }

    pub fn position(&self) -> Vec3 {
        self.body.position()
    }

    pub fn speed(&self) -> f32 {
        self.body.speed()
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Switch controller. Leaving autonomous mode drops any pending commands.
    pub fn set_mode(&mut self, mode: ControlMode) {
        if self.mode != mode {
            debug!("Vehicle {:?}: {:?} -> {:?}", self.id, self.mode, mode);
            self.mode = mode;
            self.controls = WheelControls::default();
            self.braking = false;
            self.obstacle_detected = false;
        }
    }

    /// Commands emitted on the most recent tick
    pub fn controls(&self) -> WheelControls {
        self.controls
    }

    pub fn driver(&self) -> Option<&DriverActor> {
        self.driver.as_ref()
    }

    /// Unseat the driver, transferring ownership to the caller
    pub fn take_driver(&mut self) -> Option<DriverActor> {
        self.driver.take()
    }

    pub fn markers(&self) -> &SeatMarkers {
        &self.markers
    }

    /// World-space pose of a marker, if the model has it
    pub fn marker_pose(&self, marker: Marker) -> Option<Pose> {
        self.markers
            .get(marker)
            .map(|local| self.body.pose.transform_pose(&local))
    }

    /// Run one tick: pick wheel commands for the current controller, integrate
    /// the body and carry the driver along
    pub fn update(
        &mut self,
        delta_secs: f32,
        path: &WaypointPath,
        config: &VehicleConfig,
        drive_config: &PlayerDriveConfig,
        input: Option<&InputFrame>,
        physics: &dyn Physics,
    ) {
        let controls = match self.mode {
            ControlMode::Autonomous => self.autonomous_controls(delta_secs, path, config, physics),
            ControlMode::Player => {
                let input = input.copied().unwrap_or_default();
                self.player_controls(delta_secs, &input, drive_config)
            }
            ControlMode::Parked => WheelControls::default(),
        };
        self.body.step_wheeled(&controls, &self.chassis, delta_secs);
        self.pin_driver();
    }

    /// Waypoint-following controller. Updates the braking/obstacle flags and
    /// the waypoint index, damps velocity when blocked, and returns the
    /// wheel commands for this tick.
    pub fn autonomous_controls(
        &mut self,
        delta_secs: f32,
        path: &WaypointPath,
        config: &VehicleConfig,
        physics: &dyn Physics,
    ) -> WheelControls {
        self.obstacle_detected = self.detect_obstacle(config, physics);

        if !self.obstacle_detected {
            self.braking = false;
            self.controls.steer_angle = self.steer_angle(path, config);
            self.controls.motor_torque = self.throttle(config);
            self.advance_waypoint(path, config);
        } else {
            self.body.damp_velocity(delta_secs * config.obstacle_damping);
            self.braking = true;
            self.controls.motor_torque = 0.0;
        }

        self.controls.brake_torque = if self.braking {
            config.brake_force
        } else {
            0.0
        };
        self.controls
    }

    /// Steering angle towards a point halfway between the on-path projection
    /// of the vehicle and the current waypoint
    pub fn steer_angle(&self, path: &WaypointPath, config: &VehicleConfig) -> f32 {
        let position = self.body.position();
        let target = path.node(self.current_node);
        let previous = path.node(path.previous_index(self.current_node));

        let direction = (target - previous).normalize_or_zero();
        let on_path = previous + direction * (position - previous).dot(direction);
        let aim = on_path.lerp(target, AIM_BLEND);

        let local = self.body.pose.inverse_transform_point(aim);
        let distance = local.length();
        if distance <= f32::EPSILON {
            return 0.0;
        }
        (local.x / distance) * config.max_steer_angle
    }

    fn throttle(&self, config: &VehicleConfig) -> f32 {
        if self.body.speed_kmh() < config.max_speed && !self.braking {
            config.acceleration
        } else {
            0.0
        }
    }

    /// Lookahead is the larger of the configured distance and the distance
    /// needed to stop from the current speed
    pub fn probe_distance(&self, config: &VehicleConfig) -> f32 {
        let speed = self.body.speed();
        let deceleration = config.brake_force / self.body.mass;
        let stopping_distance = speed * speed / (2.0 * deceleration);
        stopping_distance.max(config.detection_distance)
    }

    fn detect_obstacle(&self, config: &VehicleConfig, physics: &dyn Physics) -> bool {
        let origin = self.body.position() + Vec3::Y * config.probe_height;
        let filter = QueryFilter::new(LayerMask::ALL.without(Layer::Dead)).excluding(self.body_id());
        physics
            .sphere_cast(
                origin,
                config.probe_radius,
                self.body.pose.forward(),
                self.probe_distance(config),
                &filter,
            )
            .is_some()
    }

    fn advance_waypoint(&mut self, path: &WaypointPath, config: &VehicleConfig) {
        let target = path.node(self.current_node);
        if self.body.position().distance(target) < config.waypoint_distance {
            self.current_node = path.next_index(self.current_node);
        }
    }

    fn player_controls(
        &mut self,
        delta_secs: f32,
        input: &InputFrame,
        config: &PlayerDriveConfig,
    ) -> WheelControls {
        let throttle = input.axes.vertical;
        let mut motor_torque = throttle * config.acceleration;
        if self.body.speed() > config.max_speed {
            motor_torque = 0.0;
        }

        self.braking = input.brake.is_down();
        self.controls = WheelControls {
            steer_angle: input.axes.horizontal * config.steering_angle,
            motor_torque,
            brake_torque: if self.braking { config.brake_force } else { 0.0 },
        };

        if throttle.abs() < COAST_INPUT_EPSILON
            && self.body.speed_kmh() < config.idle_damping_below_kmh
        {
            self.body.damp_velocity(delta_secs * config.idle_damping);
        }

        self.controls
    }

    fn pin_driver(&mut self) {
        let Some(seat) = self.marker_pose(Marker::Driving) else {
            return;
        };
        if let Some(driver) = self.driver.as_mut() {
            driver.pose = seat;
        }
    }
}
