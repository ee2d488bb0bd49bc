//! The ECS system that runs detection, resolution and integration.

use std::ops::Bound;

use lodestar_core::{
    EcsError, EcsResult, EntityId, EntitySet, System, SystemContext, World,
};
use lodestar_shared::Vec2;

use super::resolution::{resolve_collision, BodyState, Resolution};
use super::{detect_collision, CollisionBody, CollisionInfo};
use crate::components::{Collider, Dynamics, Transform};
use crate::config::PhysicsConfig;

/// Counters for the most recent physics update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicsStats {
    /// Pairs handed to detection.
    pub pairs_tested: u32,
    /// Pairs that collided.
    pub contacts: u32,
    /// Entities queued for destruction.
    pub destroyed: u32,
    /// Bodies whose dynamics were integrated.
    pub integrated: u32,
}

/// Collision detection and response for every entity with a [`Transform`]
/// and a [`Collider`]. [`Dynamics`] is optional; bodies without it never
/// move on their own but can still be pushed.
///
/// Each frame:
/// 1. Every unordered pair is tested once, lower id as A.
/// 2. Colliding pairs are resolved in place.
/// 3. Surviving bodies integrate: `v += force·dt`, clamp, `position += v·dt`.
///
/// Entities queued for destruction earlier in the frame are skipped.
#[derive(Debug, Default)]
pub struct PhysicsSystem {
    config: PhysicsConfig,
    stats: PhysicsStats,
}

impl PhysicsSystem {
    /// Creates the system.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            stats: PhysicsStats::default(),
        }
    }

    /// Registers the physics components (unless already registered), the
    /// system itself, and its required signature.
    ///
    /// # Errors
    ///
    /// Propagates registration failures, e.g. the system already exists.
    pub fn install(world: &mut World, config: PhysicsConfig) -> EcsResult<()> {
        ensure_registered::<Transform>(world)?;
        ensure_registered::<Dynamics>(world)?;
        ensure_registered::<Collider>(world)?;

        world.register_system(Self::new(config))?;
        world.require_component::<Self, Transform>()?;
        world.require_component::<Self, Collider>()?;
        Ok(())
    }

    /// Tolerances in use.
    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Counters of the last update.
    #[must_use]
    pub fn stats(&self) -> PhysicsStats {
        self.stats
    }

    fn detect_pair(
        &self,
        ctx: &SystemContext<'_>,
        a: EntityId,
        b: EntityId,
    ) -> EcsResult<Option<CollisionInfo>> {
        let collider_a = ctx.get::<Collider>(a)?;
        let collider_b = ctx.get::<Collider>(b)?;
        if !collider_a.enabled || !collider_b.enabled {
            return Ok(None);
        }

        let body_a = CollisionBody {
            transform: ctx.get::<Transform>(a)?,
            velocity: velocity_of(ctx, a),
            shape: &collider_a.shape,
        };
        let body_b = CollisionBody {
            transform: ctx.get::<Transform>(b)?,
            velocity: velocity_of(ctx, b),
            shape: &collider_b.shape,
        };
        Ok(detect_collision(&body_a, &body_b, ctx.delta_time(), &self.config))
    }

    fn resolve_pair(
        &mut self,
        ctx: &mut SystemContext<'_>,
        a: EntityId,
        b: EntityId,
        info: &CollisionInfo,
    ) -> EcsResult<()> {
        let mut body_a = read_body(ctx, a)?;
        let mut body_b = read_body(ctx, b)?;

        let resolution = resolve_collision(info, &mut body_a, &mut body_b, &self.config);
        match resolution {
            Resolution::Destroy {
                a: destroy_a,
                b: destroy_b,
            } => {
                for (entity, doomed) in [(a, destroy_a), (b, destroy_b)] {
                    if doomed {
                        tracing::debug!(entity = %entity, "collision destroy queued");
                        ctx.commands().destroy(entity);
                        self.stats.destroyed += 1;
                    }
                }
            }
            resolved if resolved.moved() => {
                write_body(ctx, a, &body_a)?;
                write_body(ctx, b, &body_b)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn integrate(&mut self, ctx: &mut SystemContext<'_>, entities: &EntitySet) -> EcsResult<()> {
        let dt = ctx.delta_time();
        for &entity in entities {
            if ctx.commands().is_pending_destroy(entity) {
                continue;
            }
            let Some(dynamics) = ctx.try_get_mut::<Dynamics>(entity) else {
                continue;
            };
            dynamics.integrate(dt);
            let velocity = dynamics.velocity;

            ctx.get_mut::<Transform>(entity)?.position += velocity * dt;
            self.stats.integrated += 1;
        }
        Ok(())
    }
}

impl System for PhysicsSystem {
    fn init(&mut self, components: &lodestar_core::ComponentManager) -> EcsResult<()> {
        components.component_type::<Transform>()?;
        components.component_type::<Collider>()?;
        components.component_type::<Dynamics>()?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>, entities: &EntitySet) -> EcsResult<()> {
        self.stats = PhysicsStats::default();

        for &a in entities {
            for &b in entities.range((Bound::Excluded(a), Bound::Unbounded)) {
                if ctx.commands().is_pending_destroy(a) {
                    break;
                }
                if ctx.commands().is_pending_destroy(b) {
                    continue;
                }

                self.stats.pairs_tested += 1;
                let Some(info) = self.detect_pair(ctx, a, b)? else {
                    continue;
                };
                self.stats.contacts += 1;
                self.resolve_pair(ctx, a, b, &info)?;
            }
        }

        self.integrate(ctx, entities)
    }
}

fn ensure_registered<C: lodestar_core::Component>(world: &mut World) -> EcsResult<()> {
    match world.component_type::<C>() {
        Ok(_) => Ok(()),
        Err(EcsError::ComponentNotRegistered(_)) => world.register_component::<C>().map(drop),
        Err(other) => Err(other),
    }
}

fn velocity_of(ctx: &SystemContext<'_>, entity: EntityId) -> Vec2 {
    ctx.try_get::<Dynamics>(entity)
        .map_or(Vec2::ZERO, |d| d.velocity)
}

fn read_body(ctx: &SystemContext<'_>, entity: EntityId) -> EcsResult<BodyState> {
    Ok(BodyState {
        transform: *ctx.get::<Transform>(entity)?,
        dynamics: ctx.try_get::<Dynamics>(entity).copied(),
        policy: ctx.get::<Collider>(entity)?.policy,
    })
}

fn write_body(ctx: &mut SystemContext<'_>, entity: EntityId, body: &BodyState) -> EcsResult<()> {
    *ctx.get_mut::<Transform>(entity)? = body.transform;
    if let (Some(state), Some(dynamics)) = (body.dynamics, ctx.try_get_mut::<Dynamics>(entity)) {
        *dynamics = state;
    }
    Ok(())
}
