//! In-memory collaborators for headless runs and tests
//!
//! `SandboxPhysics` models every collider as a sphere, `SandboxNavigation`
//! is a flat set of rectangular surface regions, and `SandboxPresentation`
//! records everything it is told while faking just enough of an animator
//! to drive the state-gated possession steps.

use glam::{Vec2, Vec3};
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::collaborators::{
    CameraMode, CastHit, ControlScheme, NavHit, Navigation, Notice, Physics, Presentation,
    QueryFilter,
};
use super::types::{ActorId, BodyId, Layer, SurfaceArea};

#[derive(Debug, Clone, Copy)]
struct SphereCollider {
    center: Vec3,
    radius: f32,
    layer: Layer,
}

/// Sphere-only physics scene
#[derive(Debug, Default)]
pub struct SandboxPhysics {
    colliders: BTreeMap<BodyId, SphereCollider>,
    next_static: usize,
}

impl SandboxPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a piece of level geometry
    pub fn add_static(&mut self, center: Vec3, radius: f32) -> BodyId {
        let body = BodyId::Static(self.next_static);
        self.next_static += 1;
        self.sync_body(body, center, radius, Layer::Static);
        body
    }

    pub fn contains(&self, body: BodyId) -> bool {
        self.colliders.contains_key(&body)
    }

    pub fn layer_of(&self, body: BodyId) -> Option<Layer> {
        self.colliders.get(&body).map(|collider| collider.layer)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<CastHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        self.colliders
            .iter()
            .filter(|(body, collider)| filter.accepts(**body, collider.layer))
            .filter_map(|(body, collider)| {
                let distance =
                    ray_sphere(origin, direction, collider.center, collider.radius + radius)?;
                if distance > max_distance {
                    return None;
                }
                let swept_center = origin + direction * distance;
                let normal = (swept_center - collider.center).normalize_or_zero();
                Some(CastHit {
                    body: *body,
                    layer: collider.layer,
                    distance,
                    point: collider.center + normal * collider.radius,
                    normal,
                })
            })
            .min_by_key(|hit| OrderedFloat(hit.distance))
    }
}

/// Entry distance of a ray into a sphere. Spheres that already contain the
/// origin are not reported, as with engine sweeps.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let b = offset.dot(direction);
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

impl Physics for SandboxPhysics {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<CastHit> {
        self.cast(origin, radius, direction, max_distance, filter)
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter,
    ) -> Option<CastHit> {
        self.cast(origin, 0.0, direction, max_distance, filter)
    }

    fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        filter: &QueryFilter,
    ) -> Vec<(BodyId, Layer)> {
        self.colliders
            .iter()
            .filter(|(body, collider)| filter.accepts(**body, collider.layer))
            .filter(|(_, collider)| collider.center.distance(center) < collider.radius + radius)
            .map(|(body, collider)| (*body, collider.layer))
            .collect()
    }

    fn sync_body(&mut self, body: BodyId, center: Vec3, radius: f32, layer: Layer) {
        self.colliders.insert(
            body,
            SphereCollider {
                center,
                radius,
                layer,
            },
        );
    }

    fn remove_body(&mut self, body: BodyId) {
        self.colliders.remove(&body);
    }
}

/// Axis-aligned patch of navigable ground, in the XZ plane
#[derive(Debug, Clone, Copy)]
pub struct NavRegion {
    pub area: SurfaceArea,
    pub min: Vec2,
    pub max: Vec2,
}

impl NavRegion {
    pub fn new(area: SurfaceArea, min: Vec2, max: Vec2) -> Self {
        Self {
            area,
            min: min.min(max),
            max: min.max(max),
        }
    }

    fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Flat navigation surface made of rectangles at a fixed height. Paths are
/// straight lines; earlier regions win ties where regions overlap.
#[derive(Debug, Default)]
pub struct SandboxNavigation {
    regions: Vec<NavRegion>,
    ground_height: f32,
}

impl SandboxNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, area: SurfaceArea, min: Vec2, max: Vec2) -> Self {
        self.add_region(area, min, max);
        self
    }

    pub fn add_region(&mut self, area: SurfaceArea, min: Vec2, max: Vec2) {
        self.regions.push(NavRegion::new(area, min, max));
    }

    pub fn regions(&self) -> &[NavRegion] {
        &self.regions
    }
}

impl Navigation for SandboxNavigation {
    fn sample_position(
        &self,
        center: Vec3,
        max_distance: f32,
        area: Option<SurfaceArea>,
    ) -> Option<NavHit> {
        let flat = Vec2::new(center.x, center.z);
        self.regions
            .iter()
            .filter(|region| area.map_or(true, |wanted| region.area == wanted))
            .map(|region| {
                let closest = region.closest_point(flat);
                let position = Vec3::new(closest.x, self.ground_height, closest.y);
                (region.area, position, position.distance(center))
            })
            .filter(|(_, _, distance)| *distance <= max_distance)
            .min_by_key(|(_, _, distance)| OrderedFloat(*distance))
            .map(|(area, position, _)| NavHit { position, area })
    }

    fn find_path(&self, _from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        Some(vec![to])
    }
}

/// Parameter that flips an actor between its seated and walking states
const DRIVING_PARAM: &str = "driving";
const SEATED_STATE: &str = "Driving";
const DEFAULT_WALK_STATE: &str = "Walking";

#[derive(Debug, Clone, Default)]
struct AnimatorState {
    current: Option<String>,
    /// Target state and seconds left until it is reached
    pending: Option<(String, f32)>,
}

/// Records presentation calls and fakes animator state transitions
#[derive(Debug)]
pub struct SandboxPresentation {
    bools: HashMap<(ActorId, String), bool>,
    floats: HashMap<(ActorId, String), f32>,
    clips: Vec<(ActorId, String)>,
    disabled_animators: HashSet<ActorId>,
    animators: HashMap<ActorId, AnimatorState>,
    walk_states: HashMap<ActorId, String>,
    /// Seconds an animator takes to blend into a new state
    pub transition_time: f32,
    pub camera: CameraMode,
    pub crosshair_visible: bool,
    pub control_scheme: ControlScheme,
    pub notices: Vec<Notice>,
}

impl Default for SandboxPresentation {
    fn default() -> Self {
        Self {
            bools: HashMap::new(),
            floats: HashMap::new(),
            clips: Vec::new(),
            disabled_animators: HashSet::new(),
            animators: HashMap::new(),
            walk_states: HashMap::new(),
            transition_time: 0.5,
            camera: CameraMode::OnFoot,
            crosshair_visible: true,
            control_scheme: ControlScheme::OnFoot,
            notices: Vec::new(),
        }
    }
}

impl SandboxPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the state an actor's animator settles in when it stops driving
    pub fn set_walk_state(&mut self, actor: ActorId, state: &str) {
        self.walk_states.insert(actor, state.to_string());
    }

    /// Jump an animator straight into `state`, dropping any transition
    pub fn force_state(&mut self, actor: ActorId, state: &str) {
        let animator = self.animators.entry(actor).or_default();
        animator.current = Some(state.to_string());
        animator.pending = None;
    }

    pub fn current_state(&self, actor: ActorId) -> Option<&str> {
        self.animators
            .get(&actor)
            .and_then(|animator| animator.current.as_deref())
    }

    pub fn bool_param(&self, actor: ActorId, parameter: &str) -> Option<bool> {
        self.bools.get(&(actor, parameter.to_string())).copied()
    }

    pub fn float_param(&self, actor: ActorId, parameter: &str) -> Option<f32> {
        self.floats.get(&(actor, parameter.to_string())).copied()
    }

    /// Clips played on `actor`, oldest first
    pub fn clips_for(&self, actor: ActorId) -> Vec<&str> {
        self.clips
            .iter()
            .filter(|(played_on, _)| *played_on == actor)
            .map(|(_, clip)| clip.as_str())
            .collect()
    }

    pub fn animator_enabled(&self, actor: ActorId) -> bool {
        !self.disabled_animators.contains(&actor)
    }

    fn walk_state(&self, actor: ActorId) -> String {
        self.walk_states
            .get(&actor)
            .cloned()
            .unwrap_or_else(|| DEFAULT_WALK_STATE.to_string())
    }

    fn begin_transition(&mut self, actor: ActorId, target: String) {
        let delay = self.transition_time;
        let animator = self.animators.entry(actor).or_default();
        if delay <= 0.0 {
            animator.current = Some(target);
            animator.pending = None;
        } else {
            animator.pending = Some((target, delay));
        }
    }
}

impl Presentation for SandboxPresentation {
    fn set_bool(&mut self, actor: ActorId, parameter: &str, value: bool) {
        self.bools.insert((actor, parameter.to_string()), value);
        if parameter == DRIVING_PARAM {
            let target = if value {
                SEATED_STATE.to_string()
            } else {
                self.walk_state(actor)
            };
            self.begin_transition(actor, target);
        }
    }

    fn set_float(&mut self, actor: ActorId, parameter: &str, value: f32) {
        self.floats.insert((actor, parameter.to_string()), value);
    }

    fn play_clip(&mut self, actor: ActorId, clip: &str) {
        self.clips.push((actor, clip.to_string()));
    }

    fn set_animator_enabled(&mut self, actor: ActorId, enabled: bool) {
        if enabled {
            self.disabled_animators.remove(&actor);
        } else {
            self.disabled_animators.insert(actor);
        }
    }

    /// An animator mid-transition is in no named state yet
    fn in_state(&self, actor: ActorId, state: &str) -> bool {
        match self.animators.get(&actor) {
            Some(animator) => {
                animator.pending.is_none() && animator.current.as_deref() == Some(state)
            }
            None => false,
        }
    }

    fn set_camera_mode(&mut self, mode: CameraMode) {
        self.camera = mode;
    }

    fn set_crosshair_visible(&mut self, visible: bool) {
        self.crosshair_visible = visible;
    }

    fn set_control_scheme(&mut self, scheme: ControlScheme) {
        self.control_scheme = scheme;
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn advance(&mut self, delta_secs: f32) {
        for animator in self.animators.values_mut() {
            let Some((target, remaining)) = animator.pending.take() else {
                continue;
            };
            let remaining = remaining - delta_secs;
            if remaining <= 0.0 {
                animator.current = Some(target);
            } else {
                animator.pending = Some((target, remaining));
            }
        }
    }
}
