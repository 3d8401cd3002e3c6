//! Standalone street simulation module
//!
//! Vehicles that follow a looping road, pedestrians that patrol, panic and
//! die, and a player who walks, shoots and takes over cars. All engine
//! services sit behind the traits in `collaborators`, so the whole thing
//! runs and is tested from the console.

mod body;
mod collaborators;
mod config;
mod error;
mod input;
mod path;
mod pedestrian;
mod pedestrian_spawner;
mod player;
mod possession;
mod rig;
mod sandbox;
mod types;
mod vehicle;
mod vehicle_spawner;
mod weapon;
mod world;

// Re-export public types for external use
pub use body::{Chassis, RigidBody, WheelControls};
pub use collaborators::{
    CameraMode, CastHit, ControlScheme, LayerMask, NavHit, Navigation, Notice, Physics,
    Presentation, QueryFilter,
};
pub use config::{
    PedestrianConfig, PedestrianSpawnConfig, PlayerConfig, PlayerDriveConfig, PossessionConfig,
    SimConfig, VehicleConfig, VehicleSpawnConfig, WeaponConfig,
};
pub use error::{SimError, SimResult};
pub use input::{Axes, ButtonState, InputFrame};
pub use path::WaypointPath;
pub use pedestrian::{PatrolPhase, PedestrianAgent, PedestrianState};
pub use pedestrian_spawner::{PedestrianScanReport, PedestrianSpawner, PEDESTRIAN_VARIANTS};
pub use player::{PlayerCharacter, PLAYER_RADIUS};
pub use possession::{
    InteractOutcome, PossessionContext, PossessionController, PossessionSession, PossessionState,
    SessionPhase,
};
pub use rig::{BodyPart, Rig, ROOT};
pub use sandbox::{NavRegion, SandboxNavigation, SandboxPhysics, SandboxPresentation};
pub use types::{
    yaw_towards, ActorId, BodyId, IdGenerator, Layer, PedestrianId, Pose, SimId, SurfaceArea,
    VehicleId, MS_TO_KMH,
};
pub use vehicle::{ControlMode, DriverActor, Marker, SeatMarkers, VehicleAgent};
pub use vehicle_spawner::{
    SlotRegistry, VehicleScanReport, VehicleSpawner, DRIVER_VARIANTS, VEHICLE_PROXY_HEIGHT,
};
pub use weapon::{PedestrianHit, Shot, Weapon};
pub use world::{SandboxWorld, SimWorld, WorldStats};
