//! Tunable parameters for every subsystem
//!
//! Each struct defaults to the values the street scene was balanced with.
//! Distances are in world units, durations in seconds.

/// Autonomous driving parameters for AI-controlled vehicles
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Maximum front wheel steering angle in degrees
    pub max_steer_angle: f32,
    /// Motor torque applied to each driven wheel
    pub acceleration: f32,
    /// Speed cap in km/h
    pub max_speed: f32,
    /// Brake torque applied to every wheel while braking
    pub brake_force: f32,
    /// Distance at which the current waypoint counts as reached
    pub waypoint_distance: f32,
    /// Minimum lookahead of the obstacle probe
    pub detection_distance: f32,
    pub probe_radius: f32,
    /// Height above the body origin the probe starts at
    pub probe_height: f32,
    /// Rate at which velocity is blended towards zero while an obstacle is ahead
    pub obstacle_damping: f32,
    pub mass: f32,
    pub wheelbase: f32,
    pub wheel_radius: f32,
    pub driven_wheels: u32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_steer_angle: 30.0,
            acceleration: 1000.0,
            max_speed: 50.0,
            brake_force: 3000.0,
            waypoint_distance: 1.0,
            detection_distance: 10.0,
            probe_radius: 1.0,
            probe_height: 0.5,
            obstacle_damping: 5.0,
            mass: 1500.0,
            wheelbase: 2.6,
            wheel_radius: 0.35,
            driven_wheels: 2,
        }
    }
}

/// Parameters used while the player drives a vehicle
#[derive(Debug, Clone)]
pub struct PlayerDriveConfig {
    pub steering_angle: f32,
    pub acceleration: f32,
    /// Compared against the raw velocity magnitude
    pub max_speed: f32,
    pub brake_force: f32,
    /// Coasting below this speed (km/h) bleeds velocity off
    pub idle_damping_below_kmh: f32,
    pub idle_damping: f32,
}

impl Default for PlayerDriveConfig {
    fn default() -> Self {
        Self {
            steering_angle: 30.0,
            acceleration: 1000.0,
            max_speed: 50.0,
            brake_force: 3000.0,
            idle_damping_below_kmh: 10.0,
            idle_damping: 2.0,
        }
    }
}

/// Pedestrian behaviour parameters
#[derive(Debug, Clone)]
pub struct PedestrianConfig {
    pub health: i32,
    pub default_speed: f32,
    pub boosted_speed: f32,
    pub boost_duration: f32,
    /// Pause at each patrol waypoint outside of a boost
    pub idle_duration: f32,
    pub hearing_range: f32,
    /// Vehicle speed above which a single contact kills
    pub lethal_vehicle_speed: f32,
    /// Search radius used to step off a road area
    pub road_escape_radius: f32,
    /// Radius used to classify the surface under the pedestrian
    pub surface_probe_radius: f32,
    pub stopping_distance: f32,
    /// Collider radius used for contacts and physics proxies
    pub body_radius: f32,
    /// Hits at or above this height over the feet count as head hits
    pub head_height: f32,
}

impl Default for PedestrianConfig {
    fn default() -> Self {
        Self {
            health: 3,
            default_speed: 3.5,
            boosted_speed: 6.0,
            boost_duration: 10.0,
            idle_duration: 3.0,
            hearing_range: 20.0,
            lethal_vehicle_speed: 4.0,
            road_escape_radius: 10.0,
            surface_probe_radius: 1.0,
            stopping_distance: 0.5,
            body_radius: 0.4,
            head_height: 1.5,
        }
    }
}

/// Distance band and cap for vehicle spawning
#[derive(Debug, Clone)]
pub struct VehicleSpawnConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radius around a slot that must be free of other vehicles
    pub blocking_radius: f32,
    /// No new vehicles are spawned while this many are alive
    pub max_vehicles: usize,
    /// Collider radius used for physics proxies
    pub body_radius: f32,
}

impl VehicleSpawnConfig {
    pub fn min_distance_sq(&self) -> f32 {
        self.min_distance * self.min_distance
    }

    pub fn max_distance_sq(&self) -> f32 {
        self.max_distance * self.max_distance
    }
}

impl Default for VehicleSpawnConfig {
    fn default() -> Self {
        Self {
            min_distance: 150.0,
            max_distance: 200.0,
            blocking_radius: 5.0,
            max_vehicles: 20,
            body_radius: 2.0,
        }
    }
}

/// Pedestrian population parameters
#[derive(Debug, Clone)]
pub struct PedestrianSpawnConfig {
    /// Outermost sampling radius
    pub spawn_radius: f32,
    /// Minimum separation from the player during the initial burst
    pub initial_min_distance: f32,
    /// Minimum separation from the player afterwards
    pub min_distance: f32,
    pub despawn_distance: f32,
    pub spawn_interval: f32,
    pub initial_count: usize,
    pub max_count: usize,
    pub radius_steps: usize,
    pub attempts_per_step: usize,
    /// Max distance a random point may be snapped onto the nav surface
    pub sample_snap_distance: f32,
}

impl Default for PedestrianSpawnConfig {
    fn default() -> Self {
        Self {
            spawn_radius: 100.0,
            initial_min_distance: 5.0,
            min_distance: 20.0,
            despawn_distance: 200.0,
            spawn_interval: 2.0,
            initial_count: 10,
            max_count: 50,
            radius_steps: 5,
            attempts_per_step: 5,
            sample_snap_distance: 10.0,
        }
    }
}

/// Player/vehicle handoff parameters
#[derive(Debug, Clone)]
pub struct PossessionConfig {
    /// Vehicles farther than this cannot be entered
    pub detection_range: f32,
    /// Length of the door/seat sequence
    pub entry_duration: f32,
    /// Leaving is refused at or above this speed
    pub exit_speed_threshold: f32,
    /// Pause between an ejected driver landing and it running off
    pub eject_settle: f32,
    /// Vertical lift applied to an ejected driver
    pub eject_lift: f32,
    /// Animator state that marks the player as walking again
    pub player_walk_state: String,
    /// Animator state that marks an ejected driver as walking
    pub driver_walk_state: String,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            entry_duration: 3.15,
            exit_speed_threshold: 2.0,
            eject_settle: 0.1,
            eject_lift: 1.0,
            player_walk_state: "Move".to_string(),
            driver_walk_state: "Walking".to_string(),
        }
    }
}

/// On-foot movement parameters
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub walk_speed: f32,
    pub sprint_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            sprint_speed: 6.0,
        }
    }
}

/// Player weapon parameters
#[derive(Debug, Clone)]
pub struct WeaponConfig {
    /// Minimum time between shots
    pub fire_interval: f32,
    pub range: f32,
    pub body_damage: i32,
    pub head_damage: i32,
    /// Pedestrians within this radius of the shooter hear every shot
    pub alert_radius: f32,
    /// Muzzle height above the player's feet
    pub muzzle_height: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            fire_interval: 0.5,
            range: 100.0,
            body_damage: 1,
            head_damage: 10,
            alert_radius: 15.0,
            muzzle_height: 1.4,
        }
    }
}

/// Complete configuration for a `SimWorld`
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub vehicle: VehicleConfig,
    pub player_drive: PlayerDriveConfig,
    pub pedestrian: PedestrianConfig,
    pub vehicle_spawn: VehicleSpawnConfig,
    pub pedestrian_spawn: PedestrianSpawnConfig,
    pub possession: PossessionConfig,
    pub player: PlayerConfig,
    pub weapon: WeaponConfig,
}
