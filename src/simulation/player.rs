//! The player's on-foot character

use glam::Vec3;

use super::config::PlayerConfig;
use super::input::InputFrame;
use super::types::{yaw_towards, ActorId, BodyId, Pose};

/// Collider radius of the player's capsule
pub const PLAYER_RADIUS: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct PlayerCharacter {
    pub actor: ActorId,
    pub pose: Pose,
    pub velocity: Vec3,
    pub movement_enabled: bool,
    pub attack_enabled: bool,
    pub collider_enabled: bool,
    pub sprinting: bool,
}

impl PlayerCharacter {
    pub fn new(actor: ActorId, pose: Pose) -> Self {
        Self {
            actor,
            pose,
            velocity: Vec3::ZERO,
            movement_enabled: true,
            attack_enabled: true,
            collider_enabled: true,
            sprinting: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn body_id(&self) -> BodyId {
        BodyId::Player
    }

    /// Toggle walking, shooting and the character collider together
    pub fn set_on_foot_enabled(&mut self, enabled: bool) {
        self.movement_enabled = enabled;
        self.attack_enabled = enabled;
        self.collider_enabled = enabled;
        if !enabled {
            self.velocity = Vec3::ZERO;
            self.sprinting = false;
        }
    }

    /// Walk from the analog axes. The host maps camera-relative input into
    /// world axes: horizontal is +X, vertical is +Z. The character turns to
    /// face where it walks. Aiming forces walking pace.
    pub fn update(&mut self, delta_secs: f32, input: &InputFrame, config: &PlayerConfig) {
        if !self.movement_enabled {
            self.velocity = Vec3::ZERO;
            return;
        }

        self.sprinting = input.sprint.is_down();
        let aiming = input.aim.is_down();
        let speed = if self.sprinting && !aiming {
            config.sprint_speed
        } else {
            config.walk_speed
        };

        let direction = Vec3::new(input.axes.horizontal, 0.0, input.axes.vertical);
        self.velocity = direction * speed;
        self.pose.position += self.velocity * delta_secs;

        if !aiming && direction.length_squared() > f32::EPSILON {
            let position = self.pose.position;
            self.pose.rotation = yaw_towards(position, position + direction);
        }
    }
}
