//! # Engine Constants
//!
//! Defaults for every tunable the engine exposes. The values here are what
//! an empty config file produces; `EngineConfig` can override all of them
//! except [`MAX_COMPONENT_TYPES`], which is the width of a signature.

// =============================================================================
// ECS LIMITS
// =============================================================================

/// Default maximum number of concurrently live entities.
pub const MAX_ENTITIES: usize = 5000;

/// Hard ceiling on the entity pool: ids are 16-bit.
pub const ENTITY_ID_LIMIT: usize = u16::MAX as usize + 1;

/// Number of distinct component types a signature can describe.
pub const MAX_COMPONENT_TYPES: usize = 64;

// =============================================================================
// TIMING
// =============================================================================

/// Default frame cap.
pub const TARGET_FPS: u32 = 60;

/// Default interval between per-system runtime reports (milliseconds).
pub const DIAGNOSTICS_INTERVAL_MS: u64 = 1000;

/// Longest delta time fed to systems (seconds). Longer stalls are clamped.
pub const MAX_DELTA_TIME: f32 = 0.1;

// =============================================================================
// COLLISION
// =============================================================================

/// Tolerance for overlap comparisons and stationary velocity components.
pub const COLLISION_EPSILON: f32 = 0.01;

/// Extra distance a bouncing body is pushed past the contact surface.
pub const BOUNCE_OFFSET: f32 = 0.01;

/// Added to the SAT penetration depth so a resolved pair does not re-touch.
pub const SAT_BIAS: f32 = 0.001;
