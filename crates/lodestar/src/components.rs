//! # Game Components
//!
//! The plain-data components the collision engine reads and writes.
//!
//! | Component | Data |
//! |---|---|
//! | [`Transform`] | position, scale (full extents), rotation (radians) |
//! | [`Dynamics`] | velocity, force (applied as acceleration), max speed |
//! | [`Collider`] | shape, resolution policy, enabled flag |

use bytemuck::{Pod, Zeroable};
use lodestar_core::Component;
use lodestar_shared::Vec2;
use serde::{Deserialize, Serialize};

/// Placement of an entity in the world.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Centre of the entity.
    pub position: Vec2,
    /// Full width and height.
    pub scale: Vec2,
    /// Counter-clockwise rotation in radians. Ignored by AABB tests.
    pub rotation: f32,
}

impl Transform {
    /// Creates an unrotated transform.
    #[must_use]
    pub const fn new(position: Vec2, scale: Vec2) -> Self {
        Self {
            position,
            scale,
            rotation: 0.0,
        }
    }

    /// Sets the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    /// Half of [`Transform::scale`].
    #[inline]
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        self.scale * 0.5
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::splat(1.0))
    }
}

impl Component for Transform {}

/// Motion state.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Dynamics {
    /// Units per second.
    pub velocity: Vec2,
    /// Constant acceleration, units per second squared.
    pub force: Vec2,
    /// Speed cap. `f32::INFINITY` means uncapped.
    pub max_speed: f32,
}

impl Dynamics {
    /// Creates uncapped dynamics moving at `velocity` with no force.
    #[must_use]
    pub const fn new(velocity: Vec2) -> Self {
        Self {
            velocity,
            force: Vec2::ZERO,
            max_speed: f32::INFINITY,
        }
    }

    /// Sets the constant force.
    #[must_use]
    pub const fn with_force(mut self, force: Vec2) -> Self {
        self.force = force;
        self
    }

    /// Sets the speed cap.
    #[must_use]
    pub const fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Scales the velocity down to `max_speed` if it exceeds it.
    #[inline]
    pub fn clamp_speed(&mut self) {
        self.velocity = self.velocity.clamp_length(self.max_speed);
    }

    /// Advances the velocity by `force * dt`, then clamps it.
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.force * dt;
        self.clamp_speed();
    }
}

impl Default for Dynamics {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Component for Dynamics {}

/// Geometry used for collision tests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Axis-aligned box spanning the transform's scale.
    #[default]
    Rect,
    /// Convex polygon from a named model, tested with SAT.
    ///
    /// Known models are `"triangle"`, `"quad"`, `"square"` and `"rect"`.
    /// Any other name is treated as a unit quad.
    Polygon {
        /// Model name.
        model: String,
    },
}

impl ColliderShape {
    /// Polygon shape for `model`.
    #[must_use]
    pub fn polygon(model: impl Into<String>) -> Self {
        Self::Polygon {
            model: model.into(),
        }
    }
}

/// How an entity responds when it collides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Detect only (triggers).
    #[default]
    None,
    /// Cancel the velocity along the contact normal and separate.
    Slide,
    /// Reflect the incoming velocity and separate.
    Bounce,
    /// Queue the entity for destruction.
    Destroy,
}

/// Makes an entity take part in collision detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Geometry.
    pub shape: ColliderShape,
    /// Response.
    pub policy: CollisionPolicy,
    /// Disabled colliders are skipped entirely.
    pub enabled: bool,
}

impl Collider {
    /// Enabled axis-aligned box collider.
    #[must_use]
    pub fn rect(policy: CollisionPolicy) -> Self {
        Self {
            shape: ColliderShape::Rect,
            policy,
            enabled: true,
        }
    }

    /// Enabled polygon collider.
    #[must_use]
    pub fn polygon(model: impl Into<String>, policy: CollisionPolicy) -> Self {
        Self {
            shape: ColliderShape::polygon(model),
            policy,
            enabled: true,
        }
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::rect(CollisionPolicy::None)
    }
}

impl Component for Collider {}
