//! # Collision Verification Tests
//!
//! End-to-end checks of detection and resolution through a live world, plus
//! seeded randomized checks of the detection properties:
//!
//! 1. **Static AABB**: overlapping boxes report an x normal and `t_first = 0`
//! 2. **Slide**: velocity (5, 5) against an x normal becomes (0, 5)
//! 3. **Bounce**: only inbound velocity is reflected; only A bounces off B
//! 4. **MTV**: applying it separates the shapes, even when one contains the other
//! 5. **Idempotence**: detection is a pure function of its inputs
//! 6. **Swept response**: each side travels only its own path to contact, so
//!    a pair that met mid-frame never ends up interpenetrating
//!
//! Run with: cargo test -p lodestar --test collision_scenarios

use lodestar::core::{EntityId, Layer, NullDiagnostics, World};
use lodestar::physics::{
    detect_aabb_rect_rect, detect_collision, detect_sat_collision, resolve_collision, Aabb,
    BodyState, CollisionBody, Resolution, Side, WorldPolygon,
};
use lodestar::shared::Vec2;
use lodestar::{
    Collider, ColliderShape, CollisionInfo, CollisionPolicy, Dynamics, PhysicsConfig,
    PhysicsSystem, Transform,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f32 = 0.01;

fn physics_world() -> World {
    let mut world = World::with_capacity(64);
    world.systems_mut().set_diagnostics(Box::new(NullDiagnostics));
    PhysicsSystem::install(&mut world, PhysicsConfig::default()).unwrap();
    world
}

fn spawn(
    world: &mut World,
    position: Vec2,
    scale: f32,
    velocity: Vec2,
    collider: Collider,
) -> EntityId {
    let e = world.create_entity(Layer(0)).unwrap();
    world
        .add_component(e, Transform::new(position, Vec2::splat(scale)))
        .unwrap();
    world.add_component(e, Dynamics::new(velocity)).unwrap();
    world.add_component(e, collider).unwrap();
    e
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn verify_static_aabb_scenario() {
    let a = Transform::new(Vec2::ZERO, Vec2::splat(10.0));
    let b = Transform::new(Vec2::new(5.0, 0.0), Vec2::splat(10.0));

    let info = detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 1.0 / 60.0, EPS).unwrap();

    assert_eq!(info.normal.y, 0.0);
    assert_eq!(info.normal.x.abs(), 1.0);
    assert_eq!(info.t_first, 0.0);
}

#[test]
fn verify_slide_scenario() {
    let mut a = BodyState {
        transform: Transform::default(),
        dynamics: Some(Dynamics::new(Vec2::new(5.0, 5.0))),
        policy: CollisionPolicy::Slide,
    };
    let mut b = BodyState {
        dynamics: None,
        policy: CollisionPolicy::None,
        ..a
    };
    let info = CollisionInfo {
        mtv: Vec2::ZERO,
        normal: Vec2::new(1.0, 0.0),
        t_first: 0.0,
    };

    let result = resolve_collision(&info, &mut a, &mut b, &PhysicsConfig::default());

    assert_eq!(result, Resolution::Slid);
    assert_eq!(a.velocity(), Vec2::new(0.0, 5.0));
}

#[test]
fn verify_slide_against_wall_in_world() {
    let mut world = physics_world();
    let wall = world.create_entity(Layer(0)).unwrap();
    world
        .add_component(wall, Transform::new(Vec2::new(0.0, -5.0), Vec2::new(40.0, 2.0)))
        .unwrap();
    world.add_component(wall, Collider::rect(CollisionPolicy::None)).unwrap();

    // Sinking 0.5 into the top of the wall while moving down and right.
    let crate_id = spawn(
        &mut world,
        Vec2::new(0.0, -3.5),
        2.0,
        Vec2::new(3.0, -3.0),
        Collider::rect(CollisionPolicy::Slide),
    );

    world.update_systems(0.1).unwrap();

    let dynamics = world.get_component::<Dynamics>(crate_id).unwrap();
    let transform = world.get_component::<Transform>(crate_id).unwrap();
    assert_eq!(dynamics.velocity, Vec2::new(3.0, 0.0));
    // Pushed out to y = -3.0, then moved right.
    assert!(transform.position.abs_diff_eq(Vec2::new(0.3, -3.0), 1e-5));
    assert_eq!(
        world.get_component::<Transform>(wall).unwrap().position,
        Vec2::new(0.0, -5.0)
    );
}

#[test]
fn verify_asymmetric_bounce_in_world() {
    let mut world = physics_world();
    let a = spawn(
        &mut world,
        Vec2::ZERO,
        2.0,
        Vec2::new(4.0, 0.0),
        Collider::rect(CollisionPolicy::Bounce),
    );
    let b = spawn(
        &mut world,
        Vec2::new(1.5, 0.0),
        2.0,
        Vec2::new(-4.0, 0.0),
        Collider::rect(CollisionPolicy::Bounce),
    );

    world.update_systems(0.0).unwrap();

    // A (lower id) reflects; B keeps moving into A.
    assert_eq!(world.get_component::<Dynamics>(a).unwrap().velocity, Vec2::new(-4.0, 0.0));
    assert_eq!(world.get_component::<Dynamics>(b).unwrap().velocity, Vec2::new(-4.0, 0.0));
    assert_eq!(
        world.get_component::<Transform>(b).unwrap().position,
        Vec2::new(1.5, 0.0)
    );
    let pushed = world.get_component::<Transform>(a).unwrap().position;
    assert!(pushed.abs_diff_eq(Vec2::new(-0.5 - 0.01, 0.0), 1e-5));
}

#[test]
fn verify_bounce_leaves_separating_velocity() {
    let mut a = BodyState {
        transform: Transform::default(),
        dynamics: Some(Dynamics::new(Vec2::new(-2.0, 7.0))),
        policy: CollisionPolicy::Bounce,
    };
    let mut b = BodyState {
        policy: CollisionPolicy::Slide,
        ..a
    };
    let info = CollisionInfo {
        mtv: Vec2::new(0.0, 0.3),
        normal: Vec2::new(0.0, 1.0),
        t_first: 0.0,
    };

    let result = resolve_collision(&info, &mut a, &mut b, &PhysicsConfig::default());

    assert_eq!(result, Resolution::Bounced(Side::A));
    assert_eq!(a.velocity(), Vec2::new(-2.0, 7.0));
}

#[test]
fn verify_destroy_policy_removes_projectile() {
    let mut world = physics_world();
    let target = spawn(
        &mut world,
        Vec2::new(5.0, 0.0),
        2.0,
        Vec2::ZERO,
        Collider::rect(CollisionPolicy::None),
    );
    let bullet = spawn(
        &mut world,
        Vec2::ZERO,
        0.5,
        Vec2::new(50.0, 0.0),
        Collider::rect(CollisionPolicy::Destroy),
    );

    // Swept hit inside the frame.
    world.update_systems(0.1).unwrap();

    assert!(!world.entities().is_alive(bullet));
    assert!(world.entities().is_alive(target));
    assert!(world.entities_of::<PhysicsSystem>().unwrap().len() == 1);
}

#[test]
fn verify_polygon_vs_rect_uses_sat() {
    let mut world = physics_world();
    let a = spawn(
        &mut world,
        Vec2::ZERO,
        2.0,
        Vec2::ZERO,
        Collider::polygon("triangle", CollisionPolicy::Slide),
    );
    let _b = spawn(
        &mut world,
        Vec2::new(0.0, 1.5),
        2.0,
        Vec2::ZERO,
        Collider::rect(CollisionPolicy::None),
    );

    world.update_systems(0.016).unwrap();

    // The triangle's apex was 0.5 inside the box; it is pushed down.
    let position = world.get_component::<Transform>(a).unwrap().position;
    assert!(position.y < 0.0);
    assert_eq!(world.system::<PhysicsSystem>().unwrap().stats().contacts, 1);
}

fn overlap_of(world: &World, a: EntityId, b: EntityId) -> Vec2 {
    let box_a = Aabb::from_transform(world.get_component::<Transform>(a).unwrap());
    let box_b = Aabb::from_transform(world.get_component::<Transform>(b).unwrap());
    box_a.overlap(&box_b)
}

#[test]
fn verify_swept_slide_pair_stops_at_contact() {
    let mut world = physics_world();
    let a = spawn(
        &mut world,
        Vec2::ZERO,
        2.0,
        Vec2::new(10.0, 0.0),
        Collider::rect(CollisionPolicy::Slide),
    );
    let b = spawn(
        &mut world,
        Vec2::new(5.0, 0.0),
        2.0,
        Vec2::ZERO,
        Collider::rect(CollisionPolicy::Slide),
    );

    world.update_systems(1.0).unwrap();

    assert!(world
        .get_component::<Transform>(a)
        .unwrap()
        .position
        .abs_diff_eq(Vec2::new(3.0, 0.0), 1e-5));
    assert_eq!(
        world.get_component::<Transform>(b).unwrap().position,
        Vec2::new(5.0, 0.0)
    );
    assert_eq!(world.get_component::<Dynamics>(a).unwrap().velocity, Vec2::ZERO);

    let depth = overlap_of(&world, a, b);
    assert!(depth.x.min(depth.y) <= EPS, "pair interpenetrates by {depth:?}");
}

#[test]
fn verify_swept_bounce_keeps_resting_b_in_place() {
    let mut world = physics_world();
    let _a = spawn(
        &mut world,
        Vec2::ZERO,
        2.0,
        Vec2::new(10.0, 0.0),
        Collider::rect(CollisionPolicy::None),
    );
    let b = spawn(
        &mut world,
        Vec2::new(5.0, 0.0),
        2.0,
        Vec2::ZERO,
        Collider::rect(CollisionPolicy::Bounce),
    );

    world.update_systems(1.0).unwrap();

    let position = world.get_component::<Transform>(b).unwrap().position;
    assert!(position.x >= 5.0, "B was pulled towards A: {position:?}");
    assert_eq!(world.system::<PhysicsSystem>().unwrap().stats().contacts, 1);
}

#[test]
fn verify_swept_bounce_of_moving_b_leaves_pair_apart() {
    let mut world = physics_world();
    let a = spawn(
        &mut world,
        Vec2::ZERO,
        2.0,
        Vec2::ZERO,
        Collider::rect(CollisionPolicy::Slide),
    );
    let b = spawn(
        &mut world,
        Vec2::new(5.0, 0.0),
        2.0,
        Vec2::new(-10.0, 0.0),
        Collider::rect(CollisionPolicy::Bounce),
    );

    world.update_systems(1.0).unwrap();

    assert_eq!(world.get_component::<Dynamics>(b).unwrap().velocity, Vec2::new(10.0, 0.0));
    assert_eq!(world.get_component::<Transform>(a).unwrap().position, Vec2::ZERO);
    let depth = overlap_of(&world, a, b);
    assert!(depth.x.min(depth.y) <= EPS, "pair interpenetrates by {depth:?}");
}

#[test]
fn verify_swept_bounce_of_moving_a_leaves_pair_apart() {
    let mut world = physics_world();
    let a = spawn(
        &mut world,
        Vec2::ZERO,
        2.0,
        Vec2::new(10.0, 0.0),
        Collider::rect(CollisionPolicy::Bounce),
    );
    let b = spawn(
        &mut world,
        Vec2::new(5.0, 0.0),
        2.0,
        Vec2::ZERO,
        Collider::rect(CollisionPolicy::Slide),
    );

    world.update_systems(1.0).unwrap();

    assert_eq!(world.get_component::<Dynamics>(a).unwrap().velocity, Vec2::new(-10.0, 0.0));
    assert_eq!(
        world.get_component::<Transform>(b).unwrap().position,
        Vec2::new(5.0, 0.0)
    );
    let depth = overlap_of(&world, a, b);
    assert!(depth.x.min(depth.y) <= EPS, "pair interpenetrates by {depth:?}");
}

// ============================================================================
// RANDOMIZED PROPERTIES
// ============================================================================

fn random_transform(rng: &mut StdRng) -> Transform {
    Transform::new(
        Vec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)),
        Vec2::new(rng.gen_range(0.5..6.0), rng.gen_range(0.5..6.0)),
    )
    .with_rotation(rng.gen_range(0.0..std::f32::consts::TAU))
}

#[test]
fn verify_aabb_mtv_separates_and_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(0xAABB);
    let mut hits = 0;

    for _ in 0..2_000 {
        let mut a = random_transform(&mut rng);
        let b = random_transform(&mut rng);

        let first = detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS);
        let second = detect_aabb_rect_rect(&a, Vec2::ZERO, &b, Vec2::ZERO, 0.016, EPS);
        assert_eq!(first, second);

        let Some(info) = first else { continue };
        hits += 1;
        assert_eq!(info.t_first, 0.0);
        assert!((info.normal.length() - 1.0).abs() < 1e-6);

        a.position += info.mtv;
        let depth = Aabb::from_transform(&a).overlap(&Aabb::from_transform(&b));
        assert!(
            depth.x.min(depth.y) < EPS,
            "still overlapping by {depth:?} after mtv {:?}",
            info.mtv
        );
    }

    assert!(hits > 100, "too few overlapping samples: {hits}");
}

fn resting<'a>(transform: &'a Transform, shape: &'a ColliderShape) -> CollisionBody<'a> {
    CollisionBody {
        transform,
        velocity: Vec2::ZERO,
        shape,
    }
}

#[test]
fn verify_sat_mtv_separates() {
    let mut rng = StdRng::seed_from_u64(0x5A7);
    let config = PhysicsConfig::default();
    let models = ["triangle", "quad", "square", "rect", "blob"];
    let mut hits = 0;

    for _ in 0..2_000 {
        let mut ta = random_transform(&mut rng);
        let tb = random_transform(&mut rng);
        let sa = ColliderShape::polygon(models[rng.gen_range(0..models.len())]);
        let sb = ColliderShape::polygon(models[rng.gen_range(0..models.len())]);

        let Some(info) = detect_collision(&resting(&ta, &sa), &resting(&tb, &sb), 0.016, &config)
        else {
            continue;
        };
        hits += 1;

        ta.position += info.mtv;
        let moved = WorldPolygon::from_shape(&ta, &sa);
        let other = WorldPolygon::from_shape(&tb, &sb);
        assert!(detect_sat_collision(&moved, &other, config.epsilon, config.sat_bias).is_none());
    }

    assert!(hits > 100, "too few overlapping samples: {hits}");
}

#[test]
fn verify_swept_slide_resolution_ends_in_contact() {
    let mut rng = StdRng::seed_from_u64(0x5EE7);
    let config = PhysicsConfig::default();
    let mut hits = 0;

    for _ in 0..2_000 {
        let ta = random_transform(&mut rng).with_rotation(0.0);
        let tb = random_transform(&mut rng).with_rotation(0.0);
        let va = Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));
        let vb = Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));

        let Some(info) = detect_aabb_rect_rect(&ta, va, &tb, vb, 1.0, EPS) else {
            continue;
        };
        if !info.is_swept() {
            continue;
        }
        hits += 1;

        let mut a = BodyState {
            transform: ta,
            dynamics: Some(Dynamics::new(va)),
            policy: CollisionPolicy::Slide,
        };
        let mut b = BodyState {
            transform: tb,
            dynamics: Some(Dynamics::new(vb)),
            policy: CollisionPolicy::Slide,
        };
        let _ = resolve_collision(&info, &mut a, &mut b, &config);

        let depth = Aabb::from_transform(&a.transform).overlap(&Aabb::from_transform(&b.transform));
        assert!(
            depth.x.min(depth.y) <= EPS,
            "swept pair interpenetrates by {depth:?} at t_first {}",
            info.t_first
        );
    }

    assert!(hits > 20, "too few swept samples: {hits}");
}
