//! Handing control between the on-foot player and a vehicle
//!
//! The controller is a small state machine driven by "interact" presses and
//! polled once per tick. Timed steps carry a deadline, animation-gated steps
//! carry the animator state they wait for; nothing blocks.
//!
//! Entering a vehicle throws its AI driver out. That ejection runs on its own
//! alongside the entry sequence and ends with the driver rejoining the
//! pedestrian population.
//!
//! There is one player, so there is no per-vehicle lock: a second character
//! entering a vehicle mid-ejection is not a case this controller handles.

use log::{debug, info, warn};

use super::collaborators::{CameraMode, ControlScheme, Notice, Presentation};
use super::config::PossessionConfig;
use super::error::{SimError, SimResult};
use super::player::PlayerCharacter;
use super::types::{ActorId, Pose, VehicleId};
use super::vehicle::{ControlMode, DriverActor, Marker, VehicleAgent};
use super::vehicle_spawner::VehicleSpawner;

/// Animator parameter toggled when a character sits down or gets up
const DRIVING_PARAM: &str = "driving";
const DOOR_CLIP: &str = "door";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PossessionState {
    OnFoot,
    EnteringVehicle,
    Driving,
    ExitingVehicle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    Entering { ready_at: f32 },
    Driving,
    /// Waiting for the player's walk animation to start
    Exiting,
}

/// The single in-flight handoff between the player and one vehicle
#[derive(Debug, Clone)]
pub struct PossessionSession {
    pub vehicle: VehicleId,
    /// The AI driver that was thrown out, if the vehicle had one
    pub displaced_driver: Option<ActorId>,
    phase: SessionPhase,
}

impl PossessionSession {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// When the current timed step completes, if it is timed
    pub fn deadline(&self) -> Option<f32> {
        match self.phase {
            SessionPhase::Entering { ready_at } => Some(ready_at),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EjectionPhase {
    AwaitWalking,
    Settling { until: f32 },
}

/// A driver on its way out of a vehicle
#[derive(Debug)]
struct Ejection {
    vehicle: VehicleId,
    driver: DriverActor,
    phase: EjectionPhase,
}

/// What an interact press did
#[derive(Debug, Clone, PartialEq)]
pub enum InteractOutcome {
    Entering(VehicleId),
    Exiting(VehicleId),
    /// Still moving too fast to get out
    ExitRejected { speed: f32 },
    NoVehicleInRange,
    /// A transition is already under way
    Ignored,
    /// Abandoned before anything changed
    Aborted(SimError),
}

/// Everything a possession step may touch
pub struct PossessionContext<'a> {
    pub now: f32,
    pub vehicles: &'a mut VehicleSpawner,
    pub player: &'a mut PlayerCharacter,
    pub presentation: &'a mut dyn Presentation,
}

#[derive(Debug)]
pub struct PossessionController {
    config: PossessionConfig,
    session: Option<PossessionSession>,
    ejections: Vec<Ejection>,
    pub drivers_ejected: usize,
}

impl PossessionController {
    pub fn new(config: PossessionConfig) -> Self {
        Self {
            config,
            session: None,
            ejections: Vec::new(),
            drivers_ejected: 0,
        }
    }

    pub fn config(&self) -> &PossessionConfig {
        &self.config
    }

    pub fn state(&self) -> PossessionState {
        match self.session.as_ref().map(|session| session.phase) {
            None => PossessionState::OnFoot,
            Some(SessionPhase::Entering { .. }) => PossessionState::EnteringVehicle,
            Some(SessionPhase::Driving) => PossessionState::Driving,
            Some(SessionPhase::Exiting) => PossessionState::ExitingVehicle,
        }
    }

    pub fn session(&self) -> Option<&PossessionSession> {
        self.session.as_ref()
    }

    /// The vehicle taking player input this tick
    pub fn driving_vehicle(&self) -> Option<VehicleId> {
        match &self.session {
            Some(session) if session.phase == SessionPhase::Driving => Some(session.vehicle),
            _ => None,
        }
    }

    pub fn ejections_in_flight(&self) -> usize {
        self.ejections.len()
    }

    /// Whether a driver is still being thrown out of `vehicle`
    pub fn ejecting_from(&self, vehicle: VehicleId) -> bool {
        self.ejections.iter().any(|ejection| ejection.vehicle == vehicle)
    }

    /// Handle the interact button: enter the nearest vehicle when on foot,
    /// get out when driving, ignore it mid-transition
    pub fn interact(&mut self, ctx: &mut PossessionContext) -> InteractOutcome {
        match self.state() {
            PossessionState::OnFoot => {
                let range = self.config.detection_range;
                let Some(vehicle) = ctx.vehicles.nearest_within(ctx.player.position(), range) else {
                    debug!("No vehicles in range");
                    ctx.presentation.notify(Notice::NoVehicleInRange);
                    return InteractOutcome::NoVehicleInRange;
                };
                match self.enter_vehicle(vehicle, ctx) {
                    Ok(()) => InteractOutcome::Entering(vehicle),
                    Err(err) => {
                        warn!("Cannot enter vehicle: {}", err);
                        InteractOutcome::Aborted(err)
                    }
                }
            }
            PossessionState::Driving => match self.exit_vehicle(ctx) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("Cannot exit vehicle: {}", err);
                    InteractOutcome::Aborted(err)
                }
            },
            state @ (PossessionState::EnteringVehicle | PossessionState::ExitingVehicle) => {
                debug!("Interact ignored while {:?}", state);
                InteractOutcome::Ignored
            }
        }
    }

    /// Start getting into `id`. All required markers are checked before
    /// anything is changed, so an error leaves every party untouched.
    pub fn enter_vehicle(&mut self, id: VehicleId, ctx: &mut PossessionContext) -> SimResult<()> {
        if self.session.is_some() {
            return Err(SimError::SessionActive);
        }
        let vehicle = ctx
            .vehicles
            .get_mut(id)
            .ok_or(SimError::UnknownVehicle(id))?;

        let enter_pose = required_marker(vehicle, Marker::Enter)?;
        required_marker(vehicle, Marker::Driving)?;
        let eject_pose = match vehicle.driver() {
            Some(_) => Some(required_marker(vehicle, Marker::NpcEject)?),
            None => None,
        };

        ctx.player.set_on_foot_enabled(false);
        ctx.player.pose = enter_pose;

        vehicle.set_mode(ControlMode::Parked);
        vehicle.body.kinematic = true;

        // The driver can only be taken once, so a vehicle never has two
        // ejections in flight
        let displaced_driver = match (vehicle.take_driver(), eject_pose) {
            (Some(driver), Some(pose)) => {
                let actor = driver.actor;
                self.start_ejection(id, driver, pose, ctx.presentation);
                Some(actor)
            }
            _ => None,
        };

        ctx.presentation.set_control_scheme(ControlScheme::Driving);
        ctx.presentation.set_camera_mode(CameraMode::FollowVehicle(id));
        ctx.presentation.set_crosshair_visible(false);
        ctx.presentation.set_bool(ctx.player.actor, DRIVING_PARAM, true);
        ctx.presentation.play_clip(vehicle.actor, DOOR_CLIP);

        self.session = Some(PossessionSession {
            vehicle: id,
            displaced_driver,
            phase: SessionPhase::Entering {
                ready_at: ctx.now + self.config.entry_duration,
            },
        });
        info!("Player entering vehicle {:?}", id);
        Ok(())
    }

    /// Start getting out of the vehicle being driven, if it is slow enough
    pub fn exit_vehicle(&mut self, ctx: &mut PossessionContext) -> SimResult<InteractOutcome> {
        let Some(session) = self.session.as_mut() else {
            return Ok(InteractOutcome::Ignored);
        };
        if session.phase != SessionPhase::Driving {
            return Ok(InteractOutcome::Ignored);
        }
        let id = session.vehicle;
        let vehicle = ctx
            .vehicles
            .get_mut(id)
            .ok_or(SimError::UnknownVehicle(id))?;

        let speed = vehicle.speed();
        if speed >= self.config.exit_speed_threshold {
            debug!("Vehicle {:?} moving too fast to exit ({:.2})", id, speed);
            ctx.presentation.notify(Notice::ExitRejected { speed });
            return Ok(InteractOutcome::ExitRejected { speed });
        }
        let exit_pose = required_marker(vehicle, Marker::Exit)?;

        vehicle.set_mode(ControlMode::Parked);
        vehicle.body.kinematic = true;
        ctx.presentation.set_bool(ctx.player.actor, DRIVING_PARAM, false);
        ctx.presentation.play_clip(vehicle.actor, DOOR_CLIP);
        ctx.player.pose = exit_pose;

        session.phase = SessionPhase::Exiting;
        info!("Player exiting vehicle {:?}", id);
        Ok(InteractOutcome::Exiting(id))
    }

    /// Poll the session and every ejection once. Returns drivers that have
    /// finished getting out and should become pedestrians.
    pub fn tick(&mut self, ctx: &mut PossessionContext) -> Vec<DriverActor> {
        let released = self.poll_ejections(ctx);
        self.advance_session(ctx);
        released
    }

    fn advance_session(&mut self, ctx: &mut PossessionContext) {
        let Some((id, phase)) = self
            .session
            .as_ref()
            .map(|session| (session.vehicle, session.phase))
        else {
            return;
        };

        let Some(vehicle) = ctx.vehicles.get_mut(id) else {
            warn!("Vehicle {:?} disappeared during possession, back on foot", id);
            self.session = None;
            return_on_foot(ctx);
            return;
        };

        match phase {
            SessionPhase::Entering { ready_at } => {
                if ctx.now < ready_at {
                    return;
                }
                match vehicle.marker_pose(Marker::Driving) {
                    Some(seat) => ctx.player.pose = seat,
                    None => warn!("Vehicle {:?} has no DrivingPosition marker", id),
                }
                vehicle.set_mode(ControlMode::Player);
                vehicle.body.kinematic = false;
                self.set_phase(SessionPhase::Driving);
                info!("Player driving vehicle {:?}", id);
            }
            SessionPhase::Driving => {
                if let Some(seat) = vehicle.marker_pose(Marker::Driving) {
                    ctx.player.pose = seat;
                }
            }
            SessionPhase::Exiting => {
                if !ctx
                    .presentation
                    .in_state(ctx.player.actor, &self.config.player_walk_state)
                {
                    return;
                }
                match vehicle.marker_pose(Marker::Out) {
                    Some(out) => ctx.player.pose = out,
                    None => warn!("Vehicle {:?} has no OutPosition marker", id),
                }
                self.session = None;
                return_on_foot(ctx);
                info!("Player left vehicle {:?}", id);
            }
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if let Some(session) = self.session.as_mut() {
            session.phase = phase;
        }
    }

    fn start_ejection(
        &mut self,
        vehicle: VehicleId,
        mut driver: DriverActor,
        pose: Pose,
        presentation: &mut dyn Presentation,
    ) {
        driver.pose = pose;
        driver.rig.set_colliders_enabled(true);
        presentation.set_bool(driver.actor, DRIVING_PARAM, false);
        debug!("Ejecting driver {:?} from vehicle {:?}", driver.actor, vehicle);
        self.ejections.push(Ejection {
            vehicle,
            driver,
            phase: EjectionPhase::AwaitWalking,
        });
        self.drivers_ejected += 1;
    }

    fn poll_ejections(&mut self, ctx: &mut PossessionContext) -> Vec<DriverActor> {
        let mut released = Vec::new();
        for mut ejection in std::mem::take(&mut self.ejections) {
            match ejection.phase {
                EjectionPhase::AwaitWalking => {
                    if ctx
                        .presentation
                        .in_state(ejection.driver.actor, &self.config.driver_walk_state)
                    {
                        ejection.driver.pose.position.y += self.config.eject_lift;
                        ejection.phase = EjectionPhase::Settling {
                            until: ctx.now + self.config.eject_settle,
                        };
                    }
                    self.ejections.push(ejection);
                }
                EjectionPhase::Settling { until } => {
                    if ctx.now >= until {
                        info!(
                            "Driver {:?} of vehicle {:?} is back on its feet",
                            ejection.driver.actor, ejection.vehicle
                        );
                        released.push(ejection.driver);
                    } else {
                        self.ejections.push(ejection);
                    }
                }
            }
        }
        released
    }
}

fn required_marker(vehicle: &VehicleAgent, marker: Marker) -> SimResult<Pose> {
    vehicle.marker_pose(marker).ok_or(SimError::MissingMarker {
        vehicle: vehicle.id,
        marker: marker.name(),
    })
}

/// Give the player back walking, shooting, the crosshair and the on-foot camera
fn return_on_foot(ctx: &mut PossessionContext) {
    ctx.player.set_on_foot_enabled(true);
    ctx.presentation.set_bool(ctx.player.actor, DRIVING_PARAM, false);
    ctx.presentation.set_camera_mode(CameraMode::OnFoot);
    ctx.presentation.set_control_scheme(ControlScheme::OnFoot);
    ctx.presentation.set_crosshair_visible(true);
}
