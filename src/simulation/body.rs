//! Rigid body state for wheeled vehicles
//!
//! The integrator is a kinematic bicycle model: wheel torques become a
//! longitudinal force, the steering angle becomes a yaw rate, and there is
//! no lateral slip or tire friction.

use glam::{Quat, Vec3};

use super::types::{Pose, MS_TO_KMH};

/// Wheel commands emitted by a controller for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelControls {
    /// Front wheel angle in degrees, positive to the right
    pub steer_angle: f32,
    /// Torque on each driven wheel
    pub motor_torque: f32,
    /// Torque on every wheel
    pub brake_torque: f32,
}

/// Static description of a vehicle's running gear
#[derive(Debug, Clone, Copy)]
pub struct Chassis {
    pub wheelbase: f32,
    pub wheel_radius: f32,
    pub driven_wheels: u32,
    pub braked_wheels: u32,
}

impl Default for Chassis {
    fn default() -> Self {
        Self {
            wheelbase: 2.6,
            wheel_radius: 0.35,
            driven_wheels: 2,
            braked_wheels: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RigidBody {
    pub pose: Pose,
    pub velocity: Vec3,
    pub mass: f32,
    /// Kinematic bodies are frozen in place and ignore wheel torques
    pub kinematic: bool,
}

impl RigidBody {
    pub fn new(pose: Pose, mass: f32) -> Self {
        Self {
            pose,
            velocity: Vec3::ZERO,
            mass,
            kinematic: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    /// Velocity magnitude in m/s
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn speed_kmh(&self) -> f32 {
        self.speed() * MS_TO_KMH
    }

    /// Signed speed along the body's forward axis
    pub fn forward_speed(&self) -> f32 {
        self.velocity.dot(self.pose.forward())
    }

    /// Blend velocity towards zero by `t` (clamped to [0, 1])
    pub fn damp_velocity(&mut self, t: f32) {
        self.velocity = self.velocity.lerp(Vec3::ZERO, t.clamp(0.0, 1.0));
    }

    /// Advance one tick under the given wheel commands
    pub fn step_wheeled(&mut self, controls: &WheelControls, chassis: &Chassis, delta_secs: f32) {
        if self.kinematic {
            self.velocity = Vec3::ZERO;
            return;
        }

        let mut speed = self.forward_speed();

        let drive_force =
            controls.motor_torque * chassis.driven_wheels as f32 / chassis.wheel_radius;
        speed += drive_force / self.mass * delta_secs;

        // Brakes oppose motion but never reverse it
        let brake_force =
            controls.brake_torque * chassis.braked_wheels as f32 / chassis.wheel_radius;
        let brake_delta = brake_force / self.mass * delta_secs;
        if speed > 0.0 {
            speed = (speed - brake_delta).max(0.0);
        } else {
            speed = (speed + brake_delta).min(0.0);
        }

        let yaw_rate = speed * controls.steer_angle.to_radians().tan() / chassis.wheelbase;
        self.pose.rotation = Quat::from_rotation_y(yaw_rate * delta_secs) * self.pose.rotation;

        self.velocity = self.pose.forward() * speed;
        self.pose.position += self.velocity * delta_secs;
    }
}
