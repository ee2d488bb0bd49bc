//! # LODESTAR Core Engine
//!
//! Entity Component System for small 2D games:
//! - Up to 65,536 entities, 5,000 by default
//! - Up to 64 component types
//! - Systems run in registration order, once per frame
//!
//! ## Architecture Rules
//!
//! 1. **Bounded** - Entity slots and sparse indices are allocated up front
//! 2. **Consistent** - A signature bit is set iff the storage holds the component
//! 3. **Deferred structure** - Systems queue destruction, the world applies it
//!
//! ## Example
//!
//! ```rust,ignore
//! use lodestar_core::{Layer, World, WorldConfig};
//!
//! let mut world = World::new(&WorldConfig::default());
//! world.register_component::<Health>()?;
//! let e = world.create_entity(Layer(0))?;
//! world.add_component(e, Health(100))?;
//! world.update_systems(1.0 / 60.0)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::WorldConfig;
pub use ecs::{
    Commands, Component, ComponentManager, ComponentStorage, ComponentType, DiagnosticsSink,
    EntityId, EntityRegistry, EntitySet, Layer, Linkage, NullDiagnostics, RuntimeReport,
    Signature, System, SystemContext, SystemManager, SystemRuntime, TracingDiagnostics, World,
};
pub use error::{EcsError, EcsResult};
