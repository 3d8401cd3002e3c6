//! Player hitscan weapon

use glam::Vec3;

use super::collaborators::{LayerMask, Physics, QueryFilter};
use super::config::WeaponConfig;
use super::types::{BodyId, Layer, PedestrianId, Pose};

/// A pedestrian struck by a shot
#[derive(Debug, Clone, Copy)]
pub struct PedestrianHit {
    pub pedestrian: PedestrianId,
    pub point: Vec3,
}

/// Result of pulling the trigger
#[derive(Debug, Clone, Copy)]
pub struct Shot {
    /// Where the shot was heard from
    pub origin: Vec3,
    pub hit: Option<PedestrianHit>,
}

#[derive(Debug, Default)]
pub struct Weapon {
    next_fire_time: f32,
    pub shots_fired: usize,
}

impl Weapon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire along the muzzle's forward axis if the fire interval has passed.
    /// Anything solid stops the round; only the `Npc` layer counts as a hit.
    pub fn try_fire(
        &mut self,
        now: f32,
        muzzle: Pose,
        config: &WeaponConfig,
        physics: &dyn Physics,
    ) -> Option<Shot> {
        if now < self.next_fire_time {
            return None;
        }
        self.next_fire_time = now + config.fire_interval;
        self.shots_fired += 1;

        let filter = QueryFilter::new(LayerMask::ALL.without(Layer::Dead)).excluding(BodyId::Player);
        let hit = physics
            .raycast(muzzle.position, muzzle.forward(), config.range, &filter)
            .and_then(|hit| match (hit.layer, hit.body) {
                (Layer::Npc, BodyId::Pedestrian(pedestrian)) => Some(PedestrianHit {
                    pedestrian,
                    point: hit.point,
                }),
                _ => None,
            });

        Some(Shot {
            origin: muzzle.position,
            hit,
        })
    }
}
