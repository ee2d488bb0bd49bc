//! # LODESTAR
//!
//! The game-facing crate: components, collision, and the frame loop on top
//! of the `lodestar_core` ECS.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       GameLoop                               │
//! │   FrameClock ──dt──► World::update_systems(dt)               │
//! │                        │                                     │
//! │                        ├─► PhysicsSystem                     │
//! │                        │     detect (AABB / SAT)             │
//! │                        │     resolve (destroy/bounce/slide)  │
//! │                        │     integrate                       │
//! │                        └─► user systems, in order            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `components`: Transform, Dynamics, Collider
//! - `physics`: Collision detection, resolution and the physics system
//! - `game_loop`: Frame clock, FPS cap and frame statistics
//! - `config`: TOML engine configuration

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod components;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod physics;

// Re-export the layers below
pub use lodestar_core as core;
pub use lodestar_shared as shared;

// Re-export commonly used types
pub use components::{Collider, ColliderShape, CollisionPolicy, Dynamics, Transform};
pub use config::{EngineConfig, FrameConfig, PhysicsConfig};
pub use error::{EngineError, EngineResult};
pub use game_loop::{FrameClock, FrameStats, FrameStatsAccumulator, GameLoop};
pub use physics::{CollisionInfo, PhysicsStats, PhysicsSystem};
