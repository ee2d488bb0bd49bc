//! # Entity Component System
//!
//! A bounded, signature-driven ECS.
//!
//! ## Design Philosophy
//!
//! - Entity ids are 16-bit indices recycled in FIFO order
//! - Each component type owns one dense array; a sparse index maps ids to slots
//! - A 64-bit signature per entity says which components it carries
//! - Systems declare a signature and receive the matching entities each frame

mod commands;
mod component;
mod diagnostics;
mod entity;
mod storage;
mod system;
mod world;

pub use commands::Commands;
pub use component::{Component, ComponentType, Signature};
pub use diagnostics::{
    DiagnosticsSink, NullDiagnostics, RuntimeReport, SystemRuntime, TracingDiagnostics,
};
pub use entity::{EntityId, EntityRegistry, Layer};
pub use storage::{ComponentManager, ComponentStorage, ErasedStorage};
pub use system::{AsAny, EntitySet, Linkage, System, SystemContext, SystemManager};
pub use world::World;
