//! # ECS World
//!
//! The coordinator that owns the entity registry, the component storages
//! and the system registry, and keeps them consistent:
//!
//! ```text
//! add/remove component ──► storage ──► signature ──► system working sets
//! destroy entity ────────► registry ─► every storage ─► every working set
//! ```
//!
//! There is no global instance. Whoever owns the `World` passes it (or the
//! [`SystemContext`] it builds) to the code that needs it.

use std::time::Instant;

use super::commands::Commands;
use super::component::{Component, ComponentType, Signature};
use super::entity::{EntityId, EntityRegistry, Layer};
use super::storage::ComponentManager;
use super::system::{EntitySet, Linkage, System, SystemContext, SystemManager};
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// The ECS world - container for all game state.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new(&WorldConfig::default());
/// world.register_component::<Transform>()?;
/// world.register_system(PhysicsSystem::default())?;
/// world.require_component::<PhysicsSystem, Transform>()?;
///
/// let e = world.create_entity(Layer(0))?;
/// world.add_component(e, Transform::default())?;
/// world.update_systems(1.0 / 60.0)?;
/// ```
pub struct World {
    entities: EntityRegistry,
    components: ComponentManager,
    systems: SystemManager,
    commands: Commands,
}

impl World {
    /// Creates an empty world sized by `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_entities` is zero or exceeds the id space;
    /// run [`WorldConfig::validate`] first for a recoverable check.
    #[must_use]
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            entities: EntityRegistry::new(config.max_entities),
            components: ComponentManager::new(config.max_entities),
            systems: SystemManager::new(config.diagnostics_interval()),
            commands: Commands::new(),
        }
    }

    /// Creates an empty world holding at most `capacity` live entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(&WorldConfig {
            max_entities: capacity,
            ..WorldConfig::default()
        })
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// The entity registry.
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.entity_count()
    }

    /// Creates an entity with no components.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityPoolExhausted`] when the pool is full.
    pub fn create_entity(&mut self, layer: Layer) -> EcsResult<EntityId> {
        self.entities.create_entity(layer)
    }

    /// Destroys an entity immediately, purging its components and removing
    /// it from every system.
    ///
    /// Returns `false` if the entity was not live. Must not be called from
    /// inside a system update; use [`Commands::destroy`] there.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.entities.destroy_entity(entity) {
            return false;
        }
        self.components.entity_destroyed(entity);
        self.systems.entity_destroyed(entity);
        true
    }

    /// Queues `entity` for destruction at the next [`World::flush_commands`].
    pub fn queue_destroy(&mut self, entity: EntityId) {
        self.commands.destroy(entity);
    }

    /// Applies every queued structural change. Returns how many entities
    /// were destroyed.
    pub fn flush_commands(&mut self) -> usize {
        let pending = self.commands.take_destroyed();
        let mut destroyed = 0;
        for entity in pending {
            if self.destroy_entity(entity) {
                tracing::debug!(entity = %entity, "deferred destroy");
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Creates a new entity on the same layer as `source` with copies of all
    /// its components, and places it in every system `source` belongs to.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityNotFound`] if `source` is not live
    /// - [`EcsError::EntityPoolExhausted`] when the pool is full
    pub fn clone_entity(&mut self, source: EntityId) -> EcsResult<EntityId> {
        let signature = self.entities.signature(source)?;
        let layer = self.entities.layer(source)?;

        let clone = self.entities.create_entity(layer)?;
        self.components.duplicate_all(source, clone);
        self.entities.set_signature(clone, signature)?;
        self.systems.clone_entity(clone, source);

        Ok(clone)
    }

    /// Signature of a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn signature(&self, entity: EntityId) -> EcsResult<Signature> {
        self.entities.signature(entity)
    }

    /// Moves a live entity to another layer.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn set_layer(&mut self, entity: EntityId, layer: Layer) -> EcsResult<()> {
        self.entities.set_layer(entity, layer)
    }

    /// Live entities on `layer`, in id order.
    #[must_use]
    pub fn entities_in_layer(&self, layer: Layer) -> Vec<EntityId> {
        self.entities
            .entities()
            .filter(|&e| self.entities.layer(e).is_ok_and(|l| l == layer))
            .collect()
    }

    /// Re-evaluates the system membership of `entity` from its current
    /// signature. Component add/remove already does this; call it after
    /// changing system signatures or linkage.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn update_entities_list(&mut self, entity: EntityId) -> EcsResult<()> {
        let signature = self.entities.signature(entity)?;
        self.systems.update_entities_list(entity, signature);
        Ok(())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// The component storages (read-only).
    #[must_use]
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    /// Registers a component type. Must be called once per type before use.
    ///
    /// # Errors
    ///
    /// Already registered, or no signature bit left.
    pub fn register_component<C: Component>(&mut self) -> EcsResult<ComponentType> {
        self.components.register_component::<C>()
    }

    /// Runtime id of `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` is unknown.
    pub fn component_type<C: Component>(&self) -> EcsResult<ComponentType> {
        self.components.component_type::<C>()
    }

    /// Attaches a component and updates the signature and system membership.
    ///
    /// # Errors
    ///
    /// Entity not live, type not registered, or component already present.
    pub fn add_component<C: Component>(&mut self, entity: EntityId, value: C) -> EcsResult<()> {
        let mut signature = self.entities.signature(entity)?;
        let ty = self.components.component_type::<C>()?;

        self.components.add_component(entity, value)?;
        signature.insert(ty);
        self.entities.set_signature(entity, signature)?;
        self.systems.update_entities_list(entity, signature);
        Ok(())
    }

    /// Detaches and returns a component, updating the signature and system
    /// membership.
    ///
    /// # Errors
    ///
    /// Entity not live, type not registered, or component absent.
    pub fn remove_component<C: Component>(&mut self, entity: EntityId) -> EcsResult<C> {
        let mut signature = self.entities.signature(entity)?;
        let ty = self.components.component_type::<C>()?;

        let value = self.components.remove_component::<C>(entity)?;
        signature.remove(ty);
        self.entities.set_signature(entity, signature)?;
        self.systems.update_entities_list(entity, signature);
        Ok(value)
    }

    /// Gets a component.
    ///
    /// # Errors
    ///
    /// Unregistered type or absent component.
    pub fn get_component<C: Component>(&self, entity: EntityId) -> EcsResult<&C> {
        self.components.get_component(entity)
    }

    /// Gets a component mutably.
    ///
    /// # Errors
    ///
    /// Unregistered type or absent component.
    pub fn get_component_mut<C: Component>(&mut self, entity: EntityId) -> EcsResult<&mut C> {
        self.components.get_component_mut(entity)
    }

    /// Gets a component if present.
    #[must_use]
    pub fn try_get_component<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.components.try_get_component(entity)
    }

    /// Checks if `entity` carries a `C`.
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: EntityId) -> bool {
        self.try_get_component::<C>(entity).is_some()
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// The system registry.
    #[must_use]
    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// The system registry, mutably (diagnostics sink, linkage changes).
    pub fn systems_mut(&mut self) -> &mut SystemManager {
        &mut self.systems
    }

    /// Registers `system` after every system registered so far.
    ///
    /// # Errors
    ///
    /// Already registered, or `init()` failed.
    pub fn register_system<S: System>(&mut self, system: S) -> EcsResult<()> {
        self.systems.register_system(system, None, &self.components)
    }

    /// Registers `system` at position `index` in the update order.
    ///
    /// # Errors
    ///
    /// Already registered, or `init()` failed.
    pub fn register_system_at<S: System>(&mut self, system: S, index: usize) -> EcsResult<()> {
        self.systems.register_system(system, Some(index), &self.components)
    }

    /// Adds component `C` to the signature system `S` requires.
    ///
    /// # Errors
    ///
    /// `S` or `C` not registered.
    pub fn require_component<S: System, C: Component>(&mut self) -> EcsResult<()> {
        let ty = self.components.component_type::<C>()?;
        self.systems.add_component_type::<S>(ty)
    }

    /// Changes how `S` matches entity signatures.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn set_linkage<S: System>(&mut self, linkage: Linkage) -> EcsResult<()> {
        self.systems.set_linkage::<S>(linkage)
    }

    /// Enables or disables `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn set_system_active<S: System>(&mut self, active: bool) -> EcsResult<()> {
        self.systems.set_system_state::<S>(active)
    }

    /// The registered instance of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn system<S: System>(&self) -> EcsResult<&S> {
        self.systems.system::<S>()
    }

    /// The registered instance of `S`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn system_mut<S: System>(&mut self) -> EcsResult<&mut S> {
        self.systems.system_mut::<S>()
    }

    /// Working set of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn entities_of<S: System>(&self) -> EcsResult<&EntitySet> {
        self.systems.entities_of::<S>()
    }

    /// Runs one frame: every active system in registration order.
    ///
    /// Destruction queued by a system is applied as soon as that system's
    /// `update()` returns, before the next system runs.
    ///
    /// # Errors
    ///
    /// The first error returned by a system. Systems after it do not run
    /// this frame; changes it queued are still applied and the frame's
    /// timings are still recorded.
    pub fn update_systems(&mut self, delta_time: f32) -> EcsResult<()> {
        let mut outcome = Ok(());
        for index in 0..self.systems.len() {
            let mut ctx = SystemContext::new(
                &mut self.components,
                &self.entities,
                &mut self.commands,
                delta_time,
            );
            outcome = self.systems.run_system(index, &mut ctx);
            self.flush_commands();
            if outcome.is_err() {
                break;
            }
        }

        self.systems.end_frame(Instant::now());
        outcome
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(&WorldConfig::default())
    }
}
