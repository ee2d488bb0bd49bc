//! # LODESTAR Headless
//!
//! Runs a bouncing-box arena without a window and prints frame statistics.
//!
//! Usage: `lodestar_headless [FRAMES] [CONFIG.toml]`

use std::process::ExitCode;

use lodestar::core::{Layer, World};
use lodestar::shared::Vec2;
use lodestar::{
    Collider, CollisionPolicy, Dynamics, EngineConfig, EngineResult, GameLoop, PhysicsSystem,
    Transform,
};

const DEFAULT_FRAMES: u64 = 300;
const ARENA: f32 = 100.0;
const WALL: f32 = 4.0;

fn spawn(
    world: &mut World,
    transform: Transform,
    dynamics: Option<Dynamics>,
    collider: Collider,
) -> EngineResult<()> {
    let entity = world.create_entity(Layer(u16::from(dynamics.is_some())))?;
    world.add_component(entity, transform)?;
    if let Some(dynamics) = dynamics {
        world.add_component(entity, dynamics)?;
    }
    world.add_component(entity, collider)?;
    Ok(())
}

/// Four static walls, a grid of bouncing boxes and triangles, and a few
/// projectiles that vanish on first impact.
fn populate(world: &mut World) -> EngineResult<()> {
    let half = ARENA / 2.0;
    let walls = [
        (Vec2::new(0.0, -half), Vec2::new(ARENA + WALL, WALL)),
        (Vec2::new(0.0, half), Vec2::new(ARENA + WALL, WALL)),
        (Vec2::new(-half, 0.0), Vec2::new(WALL, ARENA + WALL)),
        (Vec2::new(half, 0.0), Vec2::new(WALL, ARENA + WALL)),
    ];
    for (position, scale) in walls {
        spawn(
            world,
            Transform::new(position, scale),
            None,
            Collider::rect(CollisionPolicy::None),
        )?;
    }

    for row in 0..6u8 {
        for col in 0..6u8 {
            let position = Vec2::new(f32::from(col) * 12.0 - 30.0, f32::from(row) * 12.0 - 30.0);
            let velocity = Vec2::new(f32::from(row) * 3.0 - 7.5, f32::from(col) * 2.0 - 5.0);
            let collider = if (row + col) % 3 == 0 {
                Collider::polygon("triangle", CollisionPolicy::Bounce)
            } else {
                Collider::rect(CollisionPolicy::Bounce)
            };
            spawn(
                world,
                Transform::new(position, Vec2::splat(3.0)),
                Some(Dynamics::new(velocity).with_max_speed(40.0)),
                collider,
            )?;
        }
    }

    for i in 0..3u8 {
        let y = f32::from(i) * 10.0 - 10.0;
        spawn(
            world,
            Transform::new(Vec2::new(-44.0, y), Vec2::splat(1.0)),
            Some(Dynamics::new(Vec2::new(60.0, 0.0))),
            Collider::rect(CollisionPolicy::Destroy),
        )?;
    }
    Ok(())
}

fn run(frames: u64, config: &EngineConfig) -> EngineResult<()> {
    let mut game_loop = GameLoop::new(config)?;
    populate(game_loop.world_mut())?;
    let spawned = game_loop.world().entity_count();

    game_loop.run_frames(frames)?;

    game_loop.stats().print_summary();
    println!();
    println!("┌─ WORLD ────────────────────────────────────────────────────────┐");
    println!("│ Entities Spawned:   {spawned}");
    println!("│ Entities Alive:     {}", game_loop.world().entity_count());
    if let Ok(physics) = game_loop.world().system::<PhysicsSystem>() {
        let stats = physics.stats();
        println!("│ Pairs (last frame): {}", stats.pairs_tested);
        println!("│ Contacts (last):    {}", stats.contacts);
    }
    for (name, elapsed) in game_loop
        .world()
        .systems()
        .system_names()
        .into_iter()
        .zip(game_loop.world().systems().system_times())
    {
        println!("│ {name}: {:.3} ms", elapsed.as_secs_f64() * 1000.0);
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);

    let frames = match args.next().map(|arg| arg.parse::<u64>()) {
        None => DEFAULT_FRAMES,
        Some(Ok(frames)) => frames,
        Some(Err(err)) => {
            eprintln!("invalid frame count: {err}");
            return ExitCode::FAILURE;
        }
    };

    let config = match args.next() {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    match run(frames, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
