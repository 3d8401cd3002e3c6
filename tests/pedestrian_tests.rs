use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use street_sim::simulation::{
    ActorId, DriverActor, Layer, PatrolPhase, PedestrianAgent, PedestrianConfig, PedestrianId,
    PedestrianState, Pose, Rig, SandboxNavigation, SandboxPresentation, SimId, SurfaceArea, ROOT,
};

fn pedestrian_at(position: Vec3) -> PedestrianAgent {
    PedestrianAgent::new(
        PedestrianId(SimId(1)),
        ActorId(SimId(2)),
        0,
        position,
        &PedestrianConfig::default(),
    )
}

fn open_ground() -> SandboxNavigation {
    SandboxNavigation::new().with_region(
        SurfaceArea::Walkable,
        Vec2::new(-100.0, -100.0),
        Vec2::new(100.0, 100.0),
    )
}

/// Test a fresh pedestrian patrols at default speed
#[test]
fn test_initial_state() {
    let config = PedestrianConfig::default();
    let pedestrian = pedestrian_at(Vec3::ZERO);
    assert_eq!(pedestrian.state(), PedestrianState::Patrol);
    assert_eq!(pedestrian.health(), config.health);
    assert_eq!(pedestrian.speed(), config.default_speed);
    assert_eq!(pedestrian.idle_duration(), config.idle_duration);
    assert_eq!(pedestrian.layer(), Layer::Npc);
    assert!(pedestrian.collider_enabled());
    assert!(pedestrian.nav_enabled());
}

/// Test damage starts the boost window
#[test]
fn test_damage_boosts() {
    let config = PedestrianConfig::default();
    let mut pedestrian = pedestrian_at(Vec3::ZERO);

    assert!(!pedestrian.take_damage(1, 2.0, &config));
    assert_eq!(pedestrian.state(), PedestrianState::Boosted);
    assert_eq!(pedestrian.health(), 2);
    assert_eq!(pedestrian.speed(), config.boosted_speed);
    assert_eq!(pedestrian.idle_duration(), 0.0);
    assert_eq!(pedestrian.boost_until(), Some(12.0));
}

/// Test negative damage never heals
#[test]
fn test_negative_damage_does_not_heal() {
    let config = PedestrianConfig::default();
    let mut pedestrian = pedestrian_at(Vec3::ZERO);

    assert!(!pedestrian.take_damage(-5, 0.0, &config));
    assert_eq!(pedestrian.health(), config.health);
    assert!(!pedestrian.take_damage(i32::MIN, 0.5, &config));
    assert_eq!(pedestrian.health(), config.health);

    pedestrian.take_damage(1, 1.0, &config);
    pedestrian.take_damage(1, 1.5, &config);
    assert!(pedestrian.take_damage(1, 2.0, &config), "Still three hits to kill");
    assert!(pedestrian.is_dead());
}

/// Test repeated triggers only move the deadline, never stack speed
#[test]
fn test_boost_is_idempotent() {
    let config = PedestrianConfig::default();
    let mut pedestrian = pedestrian_at(Vec3::ZERO);

    pedestrian.take_damage(1, 0.0, &config);
    pedestrian.on_heard_shooting(Vec3::new(5.0, 0.0, 0.0), 5.0, &config);
    pedestrian.on_heard_shooting(Vec3::new(5.0, 0.0, 0.0), 6.0, &config);

    assert_eq!(pedestrian.speed(), config.boosted_speed);
    assert_eq!(pedestrian.boost_until(), Some(16.0));
    assert_eq!(pedestrian.health(), 2, "Hearing shots must not hurt");
}

/// Test gunfire outside hearing range is ignored
#[test]
fn test_hearing_range() {
    let config = PedestrianConfig::default();
    let mut pedestrian = pedestrian_at(Vec3::ZERO);

    pedestrian.on_heard_shooting(Vec3::new(25.0, 0.0, 0.0), 1.0, &config);
    assert_eq!(pedestrian.state(), PedestrianState::Patrol);

    pedestrian.on_heard_shooting(Vec3::new(15.0, 0.0, 0.0), 1.0, &config);
    assert_eq!(pedestrian.state(), PedestrianState::Boosted);
}

/// Test the third body hit kills, and death turns the rig into a ragdoll
#[test]
fn test_death_after_three_hits() {
    let config = PedestrianConfig::default();
    let mut pedestrian = pedestrian_at(Vec3::ZERO);

    assert!(!pedestrian.take_damage(1, 0.0, &config));
    assert!(!pedestrian.take_damage(1, 0.5, &config));
    assert!(pedestrian.take_damage(1, 1.0, &config));

    assert!(pedestrian.is_dead());
    assert_eq!(pedestrian.state(), PedestrianState::Dead);
    assert_eq!(pedestrian.health(), 0);
    assert!(!pedestrian.nav_enabled());
    assert!(pedestrian.destination().is_none());
    assert!(!pedestrian.collider_enabled());
    assert!(pedestrian.rig().root().dynamic);
    assert!(pedestrian.rig().ragdoll_active());
    assert!(pedestrian
        .rig()
        .parts()
        .iter()
        .all(|part| part.layer == Layer::Dead));
}

/// Test death is permanent
#[test]
fn test_death_is_irreversible() {
    let config = PedestrianConfig::default();
    let mut pedestrian = pedestrian_at(Vec3::ZERO);
    pedestrian.take_damage(10, 0.0, &config);
    assert!(pedestrian.is_dead());

    assert!(!pedestrian.take_damage(1, 1.0, &config));
    pedestrian.on_heard_shooting(Vec3::ZERO, 2.0, &config);
    assert!(!pedestrian.on_vehicle_contact(20.0, &config));
    assert_eq!(pedestrian.state(), PedestrianState::Dead);
    assert_eq!(pedestrian.health(), 0);

    let navigation = open_ground();
    let mut presentation = SandboxPresentation::new();
    let mut rng = StdRng::seed_from_u64(3);
    pedestrian.update(
        0.1,
        3.0,
        &[Vec3::new(10.0, 0.0, 0.0)],
        &config,
        &navigation,
        &mut presentation,
        &mut rng,
    );
    assert_eq!(pedestrian.position, Vec3::ZERO);
    assert_eq!(pedestrian.state(), PedestrianState::Dead);
}

/// Test vehicle contact kills only above the lethal speed
#[test]
fn test_vehicle_contact_threshold() {
    let config = PedestrianConfig::default();
    let mut pedestrian = pedestrian_at(Vec3::ZERO);

    assert!(!pedestrian.on_vehicle_contact(config.lethal_vehicle_speed, &config));
    assert!(!pedestrian.is_dead());

    assert!(pedestrian.on_vehicle_contact(config.lethal_vehicle_speed + 0.5, &config));
    assert!(pedestrian.is_dead());
}

/// Test the boost runs out and defaults come back
#[test]
fn test_boost_expires() {
    let config = PedestrianConfig::default();
    let navigation = open_ground();
    let mut presentation = SandboxPresentation::new();
    let mut rng = StdRng::seed_from_u64(1);

    let mut pedestrian = pedestrian_at(Vec3::ZERO);
    pedestrian.take_damage(1, 0.0, &config);

    pedestrian.update(0.1, 9.9, &[], &config, &navigation, &mut presentation, &mut rng);
    assert_eq!(pedestrian.state(), PedestrianState::Boosted);

    pedestrian.update(0.1, 10.5, &[], &config, &navigation, &mut presentation, &mut rng);
    assert_eq!(pedestrian.state(), PedestrianState::Patrol);
    assert_eq!(pedestrian.speed(), config.default_speed);
    assert_eq!(pedestrian.idle_duration(), config.idle_duration);
    assert_eq!(pedestrian.health(), 2);
}

/// Test the patrol loop picks a waypoint, walks to it and idles
#[test]
fn test_patrol_walks_then_idles() {
    let config = PedestrianConfig::default();
    let navigation = open_ground();
    let mut presentation = SandboxPresentation::new();
    let mut rng = StdRng::seed_from_u64(1);
    let waypoints = [Vec3::new(10.0, 0.0, 0.0)];

    let mut pedestrian = pedestrian_at(Vec3::ZERO);
    pedestrian.update(0.1, 0.1, &waypoints, &config, &navigation, &mut presentation, &mut rng);

    assert_eq!(pedestrian.phase(), PatrolPhase::Moving);
    assert_eq!(pedestrian.destination(), Some(waypoints[0]));
    assert!((pedestrian.position.x - 0.35).abs() < 1e-4);
    let speed = presentation
        .float_param(pedestrian.actor, "speed")
        .expect("speed parameter should be published");
    assert!((speed - config.default_speed).abs() < 1e-3);

    let mut now = 0.1;
    for _ in 0..40 {
        now += 0.1;
        pedestrian.update(0.1, now, &waypoints, &config, &navigation, &mut presentation, &mut rng);
    }
    assert!(pedestrian.position.distance(waypoints[0]) < 1e-3);
    assert!(matches!(pedestrian.phase(), PatrolPhase::Idle { .. }));
    assert_eq!(presentation.float_param(pedestrian.actor, "speed"), Some(0.0));
}

/// Test a pedestrian standing on the road heads for the nearest sidewalk
#[test]
fn test_steps_off_road() {
    let config = PedestrianConfig::default();
    let navigation = SandboxNavigation::new()
        .with_region(SurfaceArea::Road, Vec2::new(-5.0, -5.0), Vec2::new(5.0, 5.0))
        .with_region(SurfaceArea::Walkable, Vec2::new(5.0, -5.0), Vec2::new(20.0, 5.0));
    let mut presentation = SandboxPresentation::new();
    let mut rng = StdRng::seed_from_u64(1);

    let mut pedestrian = pedestrian_at(Vec3::new(3.0, 0.0, 0.0));
    pedestrian.update(0.1, 0.1, &[], &config, &navigation, &mut presentation, &mut rng);

    assert_eq!(pedestrian.destination(), Some(Vec3::new(5.0, 0.0, 0.0)));
    assert_eq!(pedestrian.phase(), PatrolPhase::Moving);
    assert!(pedestrian.position.x > 3.0);
}

/// Test an ejected driver becomes a running pedestrian
#[test]
fn test_from_driver() {
    let config = PedestrianConfig::default();
    let driver = DriverActor::new(
        ActorId(SimId(7)),
        2,
        Pose::from_position(Vec3::new(1.0, 1.0, 1.0)),
    );

    let pedestrian = PedestrianAgent::from_driver(PedestrianId(SimId(8)), driver, &config, 4.0);
    assert_eq!(pedestrian.actor, ActorId(SimId(7)));
    assert_eq!(pedestrian.variant, 2);
    assert_eq!(pedestrian.position, Vec3::new(1.0, 1.0, 1.0));
    assert_eq!(pedestrian.state(), PedestrianState::Boosted);
    assert_eq!(pedestrian.boost_until(), Some(14.0));
    assert_eq!(pedestrian.health(), config.health);
    assert!(pedestrian.collider_enabled());
}

/// Test subtree traversal of the body-part hierarchy
#[test]
fn test_rig_layer_propagation() {
    let mut rig = Rig::new("root", Layer::Npc);
    let hips = rig.add_part(ROOT, "hips");
    let spine = rig.add_part(hips, "spine");
    let head = rig.add_part(spine, "head");
    let leg = rig.add_part(hips, "leg");

    assert_eq!(rig.descendants(ROOT), vec![hips, spine, head, leg]);
    assert_eq!(rig.descendants(spine), vec![head]);
    assert_eq!(rig.parent_of(head), Some(spine));

    rig.set_layer_recursive(spine, Layer::Dead);
    assert_eq!(rig.parts()[spine].layer, Layer::Dead);
    assert_eq!(rig.parts()[head].layer, Layer::Dead);
    assert_eq!(rig.parts()[leg].layer, Layer::Npc);
    assert_eq!(rig.root().layer, Layer::Npc);
}
