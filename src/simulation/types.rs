//! Core types for the street simulation
//!
//! Ids, poses and physics classification shared by every agent.
//! These are plain data types with no knowledge of the collaborators.

use glam::{Quat, Vec3};

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

/// A wrapper type for pedestrian IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PedestrianId(pub SimId);

/// Anything the presentation layer animates: the player, drivers,
/// pedestrians and vehicles (for door clips)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub SimId);

/// Hands out monotonically increasing ids
#[derive(Debug, Default)]
pub struct IdGenerator {
    next_id: usize,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Owner of a collider in the physics collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyId {
    Vehicle(VehicleId),
    Pedestrian(PedestrianId),
    Player,
    Static(usize),
}

/// Physics classification of a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Level geometry (walls, poles, parked props)
    Static,
    Vehicle,
    /// Live pedestrians
    Npc,
    Player,
    /// Ragdolled pedestrians, ignored by probes and weapons
    Dead,
}

/// Named navigation surface region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceArea {
    Walkable,
    Road,
    Other,
}

/// Position and orientation in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Pose at `position` turned (around the vertical axis only) towards `target`
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self::new(position, yaw_towards(position, target))
    }

    /// Local +Z in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Local +X in world space
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Express a world-space point in this pose's local frame
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Compose a pose given relative to this one into world space
    pub fn transform_pose(&self, local: &Pose) -> Pose {
        Pose::new(
            self.transform_point(local.position),
            self.rotation * local.rotation,
        )
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(Vec3::ZERO)
    }
}

/// Yaw-only rotation whose forward axis points from `from` to `to`.
/// Returns identity when the two points coincide horizontally.
pub fn yaw_towards(from: Vec3, to: Vec3) -> Quat {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    if dx * dx + dz * dz <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(dx.atan2(dz))
}

/// Convert metres per second to kilometres per hour
pub const MS_TO_KMH: f32 = 3.6;
