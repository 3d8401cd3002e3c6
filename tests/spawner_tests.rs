use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use street_sim::simulation::{
    ActorId, BodyId, IdGenerator, Layer, LayerMask, PedestrianAgent, PedestrianConfig,
    PedestrianId, PedestrianSpawnConfig, PedestrianSpawner, Physics, QueryFilter,
    SandboxNavigation, SandboxPhysics, SimId, SlotRegistry, SurfaceArea, VehicleConfig, VehicleId,
    VehicleSpawnConfig, VehicleSpawner, WaypointPath, DRIVER_VARIANTS, VEHICLE_PROXY_HEIGHT,
};

/// Four slots, all 175 units from the origin
fn ring_path() -> WaypointPath {
    WaypointPath::new(vec![
        Vec3::new(175.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 175.0),
        Vec3::new(-175.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -175.0),
    ])
    .unwrap()
}

fn sidewalk() -> SandboxNavigation {
    SandboxNavigation::new().with_region(
        SurfaceArea::Walkable,
        Vec2::new(-150.0, -150.0),
        Vec2::new(150.0, 150.0),
    )
}

/// Test the spawn band edges, which are compared on squared distances
#[test]
fn test_spawn_band_edges() {
    let spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let below = 149.9_f32;
    let above = 200.1_f32;
    assert!(!spawner.in_spawn_band(below * below));
    assert!(spawner.in_spawn_band(150.0 * 150.0));
    assert!(spawner.in_spawn_band(175.0 * 175.0));
    assert!(spawner.in_spawn_band(200.0 * 200.0));
    assert!(!spawner.in_spawn_band(above * above));
}

/// Test the slot registry refuses double binding
#[test]
fn test_slot_registry() {
    let mut registry = SlotRegistry::new();
    let first = VehicleId(SimId(1));
    let second = VehicleId(SimId(2));

    assert!(registry.insert(3, first));
    assert!(!registry.insert(3, second));
    assert_eq!(registry.lookup(3), Some(first));
    assert_eq!(registry.remove(3), Some(first));
    assert!(registry.is_empty());
    assert!(registry.insert(3, second));
}

/// Test every free in-band slot gets exactly one vehicle
#[test]
fn test_scan_spawns_into_free_slots() {
    let path = ring_path();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);
    let vehicle_config = VehicleConfig::default();

    let report = spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    assert_eq!(report.spawned.len(), 4);
    assert!(report.despawned.is_empty());

    for slot in 0..path.len() {
        let id = spawner.vehicle_at_slot(slot).expect("slot should be bound");
        let vehicle = spawner.get(id).unwrap();
        assert_eq!(vehicle.current_node, path.next_index(slot));
        assert_eq!(vehicle.position(), path.node(slot));
        assert!(vehicle.driver().unwrap().variant < DRIVER_VARIANTS);
        assert!(physics.contains(BodyId::Vehicle(id)));
    }

    // Every slot is bound now, so nothing more spawns
    let report = spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    assert!(report.spawned.is_empty());
    assert_eq!(spawner.len(), 4);
}

/// Test nothing spawns outside the band
#[test]
fn test_scan_respects_band() {
    let path = ring_path();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);

    // 100 units from slot 0, 175 or more from the rest
    let player = Vec3::new(75.0, 0.0, 0.0);
    let report = spawner.scan(player, &path, &VehicleConfig::default(), &mut physics, &mut ids, &mut rng);
    assert!(spawner.vehicle_at_slot(0).is_none());
    assert!(!report.spawned.is_empty());
    for id in report.spawned {
        let slot = spawner.slot_of(id).unwrap();
        let distance_sq = path.node(slot).distance_squared(player);
        assert!(spawner.in_spawn_band(distance_sq));
    }
}

/// Test the vehicle cap
#[test]
fn test_scan_respects_cap() {
    let path = ring_path();
    let config = VehicleSpawnConfig {
        max_vehicles: 2,
        ..Default::default()
    };
    let mut spawner = VehicleSpawner::new(config);
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);

    let report = spawner.scan(Vec3::ZERO, &path, &VehicleConfig::default(), &mut physics, &mut ids, &mut rng);
    assert_eq!(report.spawned.len(), 2);
    assert_eq!(spawner.len(), 2);
}

/// Test a vehicle parked on a slot blocks spawning there
#[test]
fn test_blocked_slot_skipped() {
    let path = ring_path();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);

    physics.sync_body(
        BodyId::Vehicle(VehicleId(SimId(999))),
        path.node(0) + Vec3::new(3.0, 0.0, 0.0),
        2.0,
        Layer::Vehicle,
    );

    let report = spawner.scan(Vec3::ZERO, &path, &VehicleConfig::default(), &mut physics, &mut ids, &mut rng);
    assert_eq!(report.spawned.len(), 3);
    assert!(spawner.vehicle_at_slot(0).is_none());
}

/// Test vehicles beyond the band are removed and their slot freed
#[test]
fn test_despawn_out_of_range() {
    let path = ring_path();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);
    let vehicle_config = VehicleConfig::default();

    spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    let id = spawner.vehicle_at_slot(0).unwrap();
    spawner.get_mut(id).unwrap().body.pose.position = Vec3::new(500.0, 0.0, 0.0);

    let report = spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    assert_eq!(report.despawned, vec![id]);
    assert!(report.spawned.is_empty(), "Slot was still bound during the spawn pass");
    assert!(spawner.get(id).is_none());
    assert!(spawner.vehicle_at_slot(0).is_none());
    assert!(!physics.contains(BodyId::Vehicle(id)));
    assert_eq!(spawner.total_despawned, 1);

    // The freed slot is filled again on the next scan
    let report = spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    assert_eq!(report.spawned.len(), 1);
    assert!(spawner.vehicle_at_slot(0).is_some());
}

/// Test a scan keeps a vehicle exactly on the outer edge and drops one just past it
#[test]
fn test_despawn_at_band_edge() {
    let path = ring_path();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);
    let vehicle_config = VehicleConfig::default();

    spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    let id = spawner.vehicle_at_slot(0).unwrap();

    spawner.get_mut(id).unwrap().body.pose.position = Vec3::new(200.0, 0.0, 0.0);
    let report = spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    assert!(report.despawned.is_empty(), "On the edge is still in range");
    assert_eq!(spawner.vehicle_at_slot(0), Some(id));

    spawner.get_mut(id).unwrap().body.pose.position = Vec3::new(200.01, 0.0, 0.0);
    let report = spawner.scan(Vec3::ZERO, &path, &vehicle_config, &mut physics, &mut ids, &mut rng);
    assert_eq!(report.despawned, vec![id]);
    assert!(spawner.vehicle_at_slot(0).is_none());
    assert!(!physics.contains(BodyId::Vehicle(id)));
}

/// Test a scan spawns on the inner edge of the band but not just inside it
#[test]
fn test_spawn_at_inner_band_edge() {
    let path = WaypointPath::new(vec![
        Vec3::new(149.9, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 150.0),
    ])
    .unwrap();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);

    let report = spawner.scan(Vec3::ZERO, &path, &VehicleConfig::default(), &mut physics, &mut ids, &mut rng);
    assert_eq!(report.spawned.len(), 1);
    assert!(spawner.vehicle_at_slot(0).is_none(), "Too close to the player");
    assert!(spawner.vehicle_at_slot(1).is_some());
}

/// Test the spawn collider sits where the world keeps it
#[test]
fn test_spawned_collider_height() {
    let path = ring_path();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);
    spawner.scan(Vec3::ZERO, &path, &VehicleConfig::default(), &mut physics, &mut ids, &mut rng);

    let filter = QueryFilter::new(LayerMask::only(Layer::Vehicle));
    // Radius 2 plus probe radius 0.1, measured from the raised centre
    let raised = path.node(0) + Vec3::Y * VEHICLE_PROXY_HEIGHT;
    let above = physics.overlap_sphere(raised + Vec3::new(0.0, 1.9, 0.0), 0.1, &filter);
    assert_eq!(above.len(), 1);
    let below = physics.overlap_sphere(path.node(0) - Vec3::new(0.0, 1.7, 0.0), 0.1, &filter);
    assert!(below.is_empty());
}

/// Test the nearest lookup uses a strict range
#[test]
fn test_nearest_within() {
    let path = ring_path();
    let mut spawner = VehicleSpawner::new(VehicleSpawnConfig::default());
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(42);
    spawner.scan(Vec3::ZERO, &path, &VehicleConfig::default(), &mut physics, &mut ids, &mut rng);

    let near_slot_1 = Vec3::new(0.0, 0.0, 165.0);
    assert_eq!(spawner.nearest_within(near_slot_1, 10.0), None);
    assert_eq!(
        spawner.nearest_within(near_slot_1, 10.5),
        spawner.vehicle_at_slot(1)
    );
}

/// Test the initial burst places everyone on walkable ground away from the player
#[test]
fn test_initial_pedestrian_burst() {
    let mut spawner = PedestrianSpawner::new(PedestrianSpawnConfig::default());
    let navigation = sidewalk();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(9);

    let placed = spawner.spawn_initial(
        Vec3::ZERO,
        &PedestrianConfig::default(),
        &navigation,
        &mut ids,
        &mut rng,
    );
    assert_eq!(placed, 10);
    assert_eq!(spawner.len(), 10);
    for pedestrian in spawner.iter() {
        assert!(pedestrian.position.length() >= 5.0);
    }
}

/// Test no walkable ground means no pedestrians
#[test]
fn test_no_walkable_ground() {
    let mut spawner = PedestrianSpawner::new(PedestrianSpawnConfig::default());
    let navigation = SandboxNavigation::new().with_region(
        SurfaceArea::Road,
        Vec2::new(-150.0, -150.0),
        Vec2::new(150.0, 150.0),
    );
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(9);

    let placed = spawner.spawn_initial(
        Vec3::ZERO,
        &PedestrianConfig::default(),
        &navigation,
        &mut ids,
        &mut rng,
    );
    assert_eq!(placed, 0);
    assert!(spawner.is_empty());
}

/// Test periodic spawning honours the interval, distance and cap
#[test]
fn test_periodic_pedestrian_spawn() {
    let config = PedestrianSpawnConfig {
        max_count: 2,
        ..Default::default()
    };
    let mut spawner = PedestrianSpawner::new(config);
    let navigation = sidewalk();
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(5);
    let pedestrian_config = PedestrianConfig::default();

    let mut scan = |spawner: &mut PedestrianSpawner, now: f32| {
        spawner.scan(
            now,
            Vec3::ZERO,
            &pedestrian_config,
            &navigation,
            &mut physics,
            &mut ids,
            &mut rng,
        )
    };

    let first = scan(&mut spawner, 0.0).spawned.expect("first attempt spawns");
    assert!(spawner.get(first).unwrap().position.length() >= 20.0);

    assert!(scan(&mut spawner, 1.0).spawned.is_none(), "Interval not elapsed");
    assert!(scan(&mut spawner, 2.0).spawned.is_some());
    assert!(scan(&mut spawner, 4.0).spawned.is_none(), "Cap reached");
    assert_eq!(spawner.len(), 2);
}

/// Test distant pedestrians are removed, and adoption ignores the cap
#[test]
fn test_pedestrian_despawn_and_adopt() {
    let config = PedestrianSpawnConfig {
        max_count: 0,
        ..Default::default()
    };
    let mut spawner = PedestrianSpawner::new(config);
    let navigation = sidewalk();
    let mut physics = SandboxPhysics::new();
    let mut ids = IdGenerator::new();
    let mut rng = StdRng::seed_from_u64(5);
    let pedestrian_config = PedestrianConfig::default();

    let near = PedestrianId(SimId(100));
    let far = PedestrianId(SimId(101));
    spawner.adopt(PedestrianAgent::new(near, ActorId(SimId(200)), 0, Vec3::new(50.0, 0.0, 0.0), &pedestrian_config));
    spawner.adopt(PedestrianAgent::new(far, ActorId(SimId(201)), 0, Vec3::new(250.0, 0.0, 0.0), &pedestrian_config));
    assert_eq!(spawner.len(), 2);

    let report = spawner.scan(
        0.0,
        Vec3::ZERO,
        &pedestrian_config,
        &navigation,
        &mut physics,
        &mut ids,
        &mut rng,
    );
    assert!(report.spawned.is_none());
    assert_eq!(report.despawned, vec![far]);
    assert!(spawner.get(near).is_some());
    assert!(spawner.get(far).is_none());
    assert_eq!(spawner.total_despawned, 1);
}
