//! # LODESTAR Shared
//!
//! Common types used by the ECS core and by the game-facing crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on `lodestar_core`. Anything that needs
//! entities or components belongs one level up.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod math;

pub use constants::{
    BOUNCE_OFFSET, COLLISION_EPSILON, DIAGNOSTICS_INTERVAL_MS, MAX_COMPONENT_TYPES,
    MAX_ENTITIES, SAT_BIAS, TARGET_FPS,
};
pub use math::Vec2;
