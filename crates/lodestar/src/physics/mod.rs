//! # LODESTAR Physics
//!
//! Pairwise collision detection and response for 2D bodies.
//!
//! ```text
//! for each pair (A, B), A = lower id:
//!   Rect  vs Rect     ──► detect_aabb_rect_rect   (static, then swept)
//!   any polygon pair  ──► detect_sat_collision    (rect becomes a quad)
//!   hit               ──► resolve_collision       (destroy > bounce > none > slide)
//! then for each body: v += force·dt, clamp, position += v·dt
//! ```
//!
//! Detection and resolution are pure functions; [`PhysicsSystem`] is the
//! only part that touches the ECS.

mod aabb;
mod resolution;
mod sat;
mod system;

use lodestar_shared::Vec2;

use crate::components::{ColliderShape, Transform};
use crate::config::PhysicsConfig;

pub use aabb::{detect_aabb_rect_rect, Aabb};
pub use resolution::{resolve_collision, BodyState, Resolution, Side};
pub use sat::{detect_sat_collision, model_vertices, WorldPolygon, MAX_POLYGON_VERTICES};
pub use system::{PhysicsStats, PhysicsSystem};

/// Result of a positive collision test between A and B.
///
/// For an overlap (`t_first == 0`) `mtv` pushes A out of B and B takes the
/// negation. For a swept hit it is A's displacement to contact relative to
/// B; each side then travels its own `velocity * t_first` instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionInfo {
    /// Translation of A out of B, or relative travel to contact.
    pub mtv: Vec2,
    /// Unit contact normal, pointing from B towards A.
    pub normal: Vec2,
    /// Time of first contact within the frame; zero when already overlapping.
    pub t_first: f32,
}

impl CollisionInfo {
    /// True if the shapes met during the frame rather than overlapping
    /// at its start.
    #[inline]
    #[must_use]
    pub fn is_swept(&self) -> bool {
        self.t_first > 0.0
    }
}

/// What detection needs to know about one side of a pair.
#[derive(Clone, Copy, Debug)]
pub struct CollisionBody<'a> {
    /// Placement.
    pub transform: &'a Transform,
    /// Velocity, zero for bodies without dynamics.
    pub velocity: Vec2,
    /// Geometry.
    pub shape: &'a ColliderShape,
}

/// Tests A against B with the algorithm their shapes call for.
#[must_use]
pub fn detect_collision(
    a: &CollisionBody<'_>,
    b: &CollisionBody<'_>,
    dt: f32,
    config: &PhysicsConfig,
) -> Option<CollisionInfo> {
    match (a.shape, b.shape) {
        (ColliderShape::Rect, ColliderShape::Rect) => detect_aabb_rect_rect(
            a.transform,
            a.velocity,
            b.transform,
            b.velocity,
            dt,
            config.epsilon,
        ),
        _ => {
            let poly_a = WorldPolygon::from_shape(a.transform, a.shape);
            let poly_b = WorldPolygon::from_shape(b.transform, b.shape);
            detect_sat_collision(&poly_a, &poly_b, config.epsilon, config.sat_bias)
        }
    }
}
