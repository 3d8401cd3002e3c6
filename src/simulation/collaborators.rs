//! Interfaces to the engine services the simulation depends on
//!
//! Physics queries, navigation-mesh queries and the presentation layer
//! (animation, camera, HUD) are owned by the host engine. The simulation only
//! talks to them through these traits; `sandbox` provides in-memory versions.

use glam::Vec3;

use super::types::{ActorId, BodyId, Layer, SurfaceArea, VehicleId};

/// Set of physics layers a query may hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask(u8);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(0xff);

    pub fn only(layer: Layer) -> Self {
        LayerMask(Self::bit(layer))
    }

    pub fn with(self, layer: Layer) -> Self {
        LayerMask(self.0 | Self::bit(layer))
    }

    pub fn without(self, layer: Layer) -> Self {
        LayerMask(self.0 & !Self::bit(layer))
    }

    pub fn contains(self, layer: Layer) -> bool {
        self.0 & Self::bit(layer) != 0
    }

    fn bit(layer: Layer) -> u8 {
        match layer {
            Layer::Static => 1 << 0,
            Layer::Vehicle => 1 << 1,
            Layer::Npc => 1 << 2,
            Layer::Player => 1 << 3,
            Layer::Dead => 1 << 4,
        }
    }
}

/// Which colliders a physics query considers
#[derive(Debug, Clone, Copy)]
pub struct QueryFilter {
    pub mask: LayerMask,
    /// Collider belonging to the caller itself
    pub exclude: Option<BodyId>,
}

impl QueryFilter {
    pub fn new(mask: LayerMask) -> Self {
        Self {
            mask,
            exclude: None,
        }
    }

    pub fn excluding(mut self, body: BodyId) -> Self {
        self.exclude = Some(body);
        self
    }

    pub fn accepts(&self, body: BodyId, layer: Layer) -> bool {
        self.mask.contains(layer) && self.exclude != Some(body)
    }
}

/// First collider hit by a cast
#[derive(Debug, Clone, Copy)]
pub struct CastHit {
    pub body: BodyId,
    pub layer: Layer,
    /// Distance travelled along the cast direction
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Physics scene queries plus proxy bookkeeping for simulated bodies
pub trait Physics {
    /// Sweep a sphere along `direction` and report the nearest hit
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<CastHit>;

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<CastHit>;

    /// Every collider overlapping the sphere
    fn overlap_sphere(&self, center: Vec3, radius: f32, filter: &QueryFilter)
        -> Vec<(BodyId, Layer)>;

    /// Create or move the collider representing a simulated body
    fn sync_body(&mut self, body: BodyId, center: Vec3, radius: f32, layer: Layer);

    fn remove_body(&mut self, body: BodyId);
}

/// A point snapped onto the navigation surface
#[derive(Debug, Clone, Copy)]
pub struct NavHit {
    pub position: Vec3,
    pub area: SurfaceArea,
}

/// Navigation-mesh queries. Path planning is entirely the collaborator's job.
pub trait Navigation {
    /// Nearest nav-surface point within `max_distance` of `center`,
    /// restricted to `area` when given
    fn sample_position(
        &self,
        center: Vec3,
        max_distance: f32,
        area: Option<SurfaceArea>,
    ) -> Option<NavHit>;

    /// Corner points from `from` to `to`, ending at `to`
    fn find_path(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>>;

    /// Classify the surface under `position`
    fn area_at(&self, position: Vec3, radius: f32) -> Option<SurfaceArea> {
        self.sample_position(position, radius, None).map(|hit| hit.area)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    OnFoot,
    FollowVehicle(VehicleId),
}

/// Which on-screen control set is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlScheme {
    OnFoot,
    Driving,
}

/// One-off messages for the HUD
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    NoVehicleInRange,
    ExitRejected { speed: f32 },
}

/// Animation, camera and HUD
pub trait Presentation {
    fn set_bool(&mut self, actor: ActorId, parameter: &str, value: bool);

    fn set_float(&mut self, actor: ActorId, parameter: &str, value: f32);

    fn play_clip(&mut self, actor: ActorId, clip: &str);

    fn set_animator_enabled(&mut self, actor: ActorId, enabled: bool);

    /// Whether the actor's animator is currently in the named state
    fn in_state(&self, actor: ActorId, state: &str) -> bool;

    fn set_camera_mode(&mut self, mode: CameraMode);

    fn set_crosshair_visible(&mut self, visible: bool);

    fn set_control_scheme(&mut self, scheme: ControlScheme);

    fn notify(&mut self, notice: Notice);

    /// Let animator state machines run for one tick
    fn advance(&mut self, _delta_secs: f32) {}
}
