//! # ECS Error Types
//!
//! All errors that can occur in the entity, component and system layers.
//!
//! Every variant except [`EcsError::EntityPoolExhausted`] is a contract
//! violation: the caller did something the API forbids. They are returned
//! at the call site so they surface immediately instead of corrupting the
//! signature/storage invariant.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors that can occur in the ECS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Every entity id in the pool is live.
    #[error("entity pool exhausted: all {capacity} ids are live")]
    EntityPoolExhausted {
        /// Size of the pool.
        capacity: usize,
    },

    /// The entity is not live.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// `register_component` was called twice for the same type.
    #[error("component type already registered: {0}")]
    ComponentAlreadyRegistered(&'static str),

    /// The component type was used before `register_component`.
    #[error("component type not registered: {0}")]
    ComponentNotRegistered(&'static str),

    /// A signature has no bit left for another component type.
    #[error("too many component types: the limit is {limit}")]
    TooManyComponentTypes {
        /// Signature width.
        limit: usize,
    },

    /// The entity already holds a component of this type.
    #[error("entity {entity} already has a {component}")]
    DuplicateComponent {
        /// The entity.
        entity: EntityId,
        /// Component type name.
        component: &'static str,
    },

    /// The entity holds no component of this type.
    #[error("entity {entity} has no {component}")]
    ComponentNotFound {
        /// The entity.
        entity: EntityId,
        /// Component type name.
        component: &'static str,
    },

    /// `register_system` was called twice for the same type.
    #[error("system already registered: {0}")]
    SystemAlreadyRegistered(&'static str),

    /// The system type was never registered.
    #[error("system not registered: {0}")]
    SystemNotRegistered(&'static str),

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
