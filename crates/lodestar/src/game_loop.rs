//! # LODESTAR Game Loop
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. BEGIN FRAME                                                      │
//! │    └─ FrameClock::tick → delta time, clamped to max_delta_time      │
//! │                                                                     │
//! │ 2. UPDATE                                                           │
//! │    └─ World::update_systems(dt), systems in registration order      │
//! │       (deferred destruction drained after each system)              │
//! │                                                                     │
//! │ 3. END FRAME                                                        │
//! │    ├─ Record FrameStats                                             │
//! │    └─ Busy-wait until the target frame duration has passed          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use lodestar_core::World;

use crate::config::{EngineConfig, FrameConfig};
use crate::error::EngineResult;
use crate::physics::PhysicsSystem;

/// Produces clamped per-frame delta times.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Instant,
    max_delta: f32,
}

impl FrameClock {
    /// Starts the clock now.
    #[must_use]
    pub fn new(max_delta: f32) -> Self {
        Self::starting_at(Instant::now(), max_delta)
    }

    /// Starts the clock at `start`.
    #[must_use]
    pub fn starting_at(start: Instant, max_delta: f32) -> Self {
        Self {
            last: start,
            max_delta,
        }
    }

    /// Seconds since the previous tick, at most `max_delta`.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Like [`FrameClock::tick`] with an explicit current time.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        // Clamp delta time to prevent physics explosion after a stall
        delta.as_secs_f32().min(self.max_delta)
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Delta time handed to the systems, in seconds.
    pub delta_time: f32,
    /// Time spent in `update_systems`, in microseconds.
    pub update_us: u64,
    /// Whole frame including the FPS throttle, in microseconds.
    pub total_us: u64,
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of update times.
    pub update_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames whose update alone exceeded the frame budget.
    pub frames_over_budget: u64,
    budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator that counts updates longer than `budget`.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            update_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            budget_us: u64::try_from(budget.as_micros()).unwrap_or(u64::MAX),
        }
    }

    /// Records a frame's statistics. Returns whether it was over budget.
    pub fn record(&mut self, stats: FrameStats) -> bool {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.update_us_sum += stats.update_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        let over = stats.update_us > self.budget_us;
        if over {
            self.frames_over_budget += 1;
        }
        over
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average update time in milliseconds.
    #[must_use]
    pub fn avg_update_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.update_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Prints a summary of the statistics.
    pub fn print_summary(&self) {
        let min_ms = if self.frames_recorded == 0 {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };

        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                    FRAME STATISTICS SUMMARY                      ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌─ TIMING ───────────────────────────────────────────────────────┐");
        println!("│ Frames Recorded:    {}", self.frames_recorded);
        println!("│ Average Frame:      {:.3} ms ({:.1} FPS)", self.avg_frame_ms(), self.avg_fps());
        println!("│ Average Update:     {:.3} ms", self.avg_update_ms());
        println!("│ Min Frame:          {min_ms:.3} ms");
        println!("│ Max Frame:          {:.3} ms", self.max_frame_us as f64 / 1000.0);
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ BUDGET ───────────────────────────────────────────────────────┐");
        println!("│ Budget:             {:.3} ms", self.budget_us as f64 / 1000.0);
        println!(
            "│ Over Budget:        {} frames ({:.1}%)",
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0
        );
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new(Duration::from_micros(16_666))
    }
}

/// The main game loop orchestrator.
///
/// Owns the ECS world and drives it one frame at a time.
pub struct GameLoop {
    world: World,
    clock: FrameClock,
    /// `None` when uncapped.
    frame_duration: Option<Duration>,
    frame_count: u64,
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Builds a world from `config` with the physics system installed.
    ///
    /// # Errors
    ///
    /// Invalid configuration or a registration failure.
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let mut world = World::new(&config.world);
        PhysicsSystem::install(&mut world, config.physics)?;
        Ok(Self::with_world(world, &config.frame))
    }

    /// Drives an existing world.
    #[must_use]
    pub fn with_world(world: World, frame: &FrameConfig) -> Self {
        let frame_duration = frame.frame_duration();
        Self {
            world,
            clock: FrameClock::new(frame.max_delta_time),
            frame_duration,
            frame_count: 0,
            stats_accumulator: FrameStatsAccumulator::new(
                frame_duration.unwrap_or(Duration::MAX),
            ),
        }
    }

    /// Runs one frame without throttling.
    ///
    /// # Errors
    ///
    /// The first error returned by a system.
    pub fn step(&mut self) -> EngineResult<FrameStats> {
        let frame_start = Instant::now();
        let delta_time = self.clock.tick_at(frame_start);
        self.run_frame(frame_start, delta_time)
    }

    /// Runs one frame with a fixed delta time, ignoring the wall clock.
    ///
    /// # Errors
    ///
    /// The first error returned by a system.
    pub fn step_fixed(&mut self, delta_time: f32) -> EngineResult<FrameStats> {
        self.run_frame(Instant::now(), delta_time)
    }

    fn run_frame(&mut self, frame_start: Instant, delta_time: f32) -> EngineResult<FrameStats> {
        self.world.update_systems(delta_time)?;
        let update = frame_start.elapsed();

        let stats = FrameStats {
            frame: self.frame_count,
            delta_time,
            update_us: update.as_micros() as u64,
            total_us: update.as_micros() as u64,
        };
        self.frame_count += 1;
        Ok(stats)
    }

    /// Runs `frames` frames, each capped to the target FPS.
    ///
    /// # Errors
    ///
    /// Stops at the first system error.
    pub fn run_frames(&mut self, frames: u64) -> EngineResult<()> {
        for _ in 0..frames {
            let frame_start = Instant::now();
            let mut stats = self.step()?;

            if let Some(target) = self.frame_duration {
                throttle(frame_start, target);
            }
            stats.total_us = frame_start.elapsed().as_micros() as u64;
            self.end_frame(stats);
        }
        Ok(())
    }

    fn end_frame(&mut self, stats: FrameStats) {
        if self.stats_accumulator.record(stats) {
            tracing::warn!(
                frame = stats.frame,
                update_ms = stats.update_us as f64 / 1000.0,
                "frame exceeded budget"
            );
        }
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The world being driven.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world being driven, mutably (spawning, configuration).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }

    /// Gives the world back.
    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }
}

/// Spins until `target` has elapsed since `frame_start`.
fn throttle(frame_start: Instant, target: Duration) {
    while frame_start.elapsed() < target {
        std::hint::spin_loop();
    }
}
