//! Collision response.
//!
//! Policies are checked in a fixed order; the first that applies decides
//! the outcome for the whole pair:
//!
//! 1. `Destroy` on either side
//! 2. `Bounce` on either side (A wins when both bounce)
//! 3. `None` on both sides
//! 4. `Slide`

use lodestar_shared::Vec2;

use super::CollisionInfo;
use crate::components::{CollisionPolicy, Dynamics, Transform};
use crate::config::PhysicsConfig;

/// Copy of the state resolution may change for one side of a pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    /// Placement.
    pub transform: Transform,
    /// Motion, if the entity has any.
    pub dynamics: Option<Dynamics>,
    /// Response policy.
    pub policy: CollisionPolicy,
}

impl BodyState {
    /// Velocity, zero without dynamics.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.dynamics.map_or(Vec2::ZERO, |d| d.velocity)
    }
}

/// One side of a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The lower-id entity.
    A,
    /// The higher-id entity.
    B,
}

/// What [`resolve_collision`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The normal was degenerate; nothing changed.
    Rejected,
    /// These sides must be destroyed; nothing else changed.
    Destroy {
        /// Destroy A.
        a: bool,
        /// Destroy B.
        b: bool,
    },
    /// One side bounced.
    Bounced(Side),
    /// Both sides are triggers; nothing changed.
    Ignored,
    /// The sliding sides were separated.
    Slid,
}

impl Resolution {
    /// True if a body state was modified and must be written back.
    #[must_use]
    pub const fn moved(self) -> bool {
        matches!(self, Self::Bounced(_) | Self::Slid)
    }
}

/// Reflects the inbound part of the motion and pushes the body clear.
fn bounce(body: &mut BodyState, normal: Vec2, push: Vec2, offset: f32) {
    if let Some(dynamics) = &mut body.dynamics {
        let into = dynamics.velocity.dot(normal);
        if into < 0.0 {
            dynamics.velocity -= normal * (2.0 * into);
            let force_into = dynamics.force.dot(normal);
            dynamics.force -= normal * (2.0 * force_into);
        }
        dynamics.clamp_speed();
    }
    body.transform.position += push + normal * offset;
}

/// Drops the velocity component along the normal.
fn slide(body: &mut BodyState, normal: Vec2, push: Vec2) {
    if let Some(dynamics) = &mut body.dynamics {
        let along = dynamics.velocity.dot(normal);
        dynamics.velocity -= normal * along;
    }
    body.transform.position += push;
}

/// Applies the collision response for A and B.
///
/// For an overlap A moves along `mtv` and B along `-mtv`. For a swept hit
/// each resolving side moves along its own path to the contact point,
/// `velocity * t_first`. Destruction is only reported; the caller queues it.
///
/// # Arguments
///
/// * `info` - Detection result for the pair
/// * `a`, `b` - Mutable copies of both sides
/// * `config` - Epsilon and bounce offset
#[must_use]
pub fn resolve_collision(
    info: &CollisionInfo,
    a: &mut BodyState,
    b: &mut BodyState,
    config: &PhysicsConfig,
) -> Resolution {
    let Some(normal) = info.normal.try_normalize(config.epsilon) else {
        tracing::trace!(normal = ?info.normal, "degenerate collision normal");
        return Resolution::Rejected;
    };
    if !info.mtv.is_finite() {
        tracing::trace!(mtv = ?info.mtv, "non-finite collision mtv");
        return Resolution::Rejected;
    }

    let destroy_a = a.policy == CollisionPolicy::Destroy;
    let destroy_b = b.policy == CollisionPolicy::Destroy;
    if destroy_a || destroy_b {
        return Resolution::Destroy {
            a: destroy_a,
            b: destroy_b,
        };
    }

    let (push_a, push_b) = if info.is_swept() {
        (a.velocity() * info.t_first, b.velocity() * info.t_first)
    } else {
        (info.mtv, -info.mtv)
    };

    if a.policy == CollisionPolicy::Bounce {
        bounce(a, normal, push_a, config.bounce_offset);
        return Resolution::Bounced(Side::A);
    }
    if b.policy == CollisionPolicy::Bounce {
        bounce(b, -normal, push_b, config.bounce_offset);
        return Resolution::Bounced(Side::B);
    }

    if a.policy == CollisionPolicy::None && b.policy == CollisionPolicy::None {
        return Resolution::Ignored;
    }

    if a.policy == CollisionPolicy::Slide {
        slide(a, normal, push_a);
    }
    if b.policy == CollisionPolicy::Slide {
        slide(b, normal, push_b);
    }
    Resolution::Slid
}
