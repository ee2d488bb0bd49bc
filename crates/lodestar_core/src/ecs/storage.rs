//! # Component Storage
//!
//! One densely packed store per component type.
//!
//! The storage uses a sparse-set strategy:
//! - The sparse index is pre-allocated to the entity capacity
//! - Values live in a contiguous array, in no particular order
//! - Removal swaps the last value into the hole, so iteration stays dense
//!
//! Storages are erased behind [`ErasedStorage`] so the [`ComponentManager`]
//! can cascade an entity's destruction through every type without knowing
//! the types at compile time.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use lodestar_shared::MAX_COMPONENT_TYPES;

use super::component::{Component, ComponentType};
use super::entity::EntityId;
use crate::error::{EcsError, EcsResult};

/// Marker for an empty sparse slot.
const VACANT: u32 = u32::MAX;

/// Dense storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Health> = ComponentStorage::new(5000);
/// storage.insert(entity, Health(100))?;
/// ```
pub struct ComponentStorage<C: Component> {
    /// Entity index -> position in `values`, or `VACANT`.
    sparse: Box<[u32]>,
    /// Owner of each value, parallel to `values`.
    owners: Vec<EntityId>,
    /// The dense array of components.
    values: Vec<C>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates storage able to address `capacity` entity ids.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            sparse: vec![VACANT; capacity].into_boxed_slice(),
            owners: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn slot(&self, entity: EntityId) -> Option<usize> {
        match self.sparse.get(entity.index()) {
            Some(&dense) if dense != VACANT => Some(dense as usize),
            _ => None,
        }
    }

    /// Checks if `entity` has a component here.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some()
    }

    /// Adds a component for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if the entity already has
    /// one; callers must remove before re-adding.
    pub fn insert(&mut self, entity: EntityId, value: C) -> EcsResult<()> {
        if self.contains(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: type_name::<C>(),
            });
        }
        let Some(sparse) = self.sparse.get_mut(entity.index()) else {
            return Err(EcsError::EntityNotFound(entity));
        };

        *sparse = self.values.len() as u32;
        self.owners.push(entity);
        self.values.push(value);
        Ok(())
    }

    /// Removes and returns the component of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotFound`] if absent.
    pub fn remove(&mut self, entity: EntityId) -> EcsResult<C> {
        self.take(entity).ok_or(EcsError::ComponentNotFound {
            entity,
            component: type_name::<C>(),
        })
    }

    /// Removes and returns the component of `entity`, if any.
    pub fn take(&mut self, entity: EntityId) -> Option<C> {
        let dense = self.slot(entity)?;
        self.sparse[entity.index()] = VACANT;

        let value = self.values.swap_remove(dense);
        self.owners.swap_remove(dense);
        if let Some(&moved) = self.owners.get(dense) {
            self.sparse[moved.index()] = dense as u32;
        }
        Some(value)
    }

    /// Gets the component of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotFound`] if absent.
    pub fn get(&self, entity: EntityId) -> EcsResult<&C> {
        self.try_get(entity).ok_or(EcsError::ComponentNotFound {
            entity,
            component: type_name::<C>(),
        })
    }

    /// Gets the component of `entity` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotFound`] if absent.
    pub fn get_mut(&mut self, entity: EntityId) -> EcsResult<&mut C> {
        self.try_get_mut(entity).ok_or(EcsError::ComponentNotFound {
            entity,
            component: type_name::<C>(),
        })
    }

    /// Gets the component of `entity`, if any.
    #[inline]
    #[must_use]
    pub fn try_get(&self, entity: EntityId) -> Option<&C> {
        self.slot(entity).map(|dense| &self.values[dense])
    }

    /// Gets the component of `entity` mutably, if any.
    #[inline]
    pub fn try_get_mut(&mut self, entity: EntityId) -> Option<&mut C> {
        self.slot(entity).map(|dense| &mut self.values[dense])
    }

    /// Iterates over `(owner, component)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> {
        self.owners.iter().copied().zip(self.values.iter())
    }
}

/// Type-erased view of a [`ComponentStorage`].
///
/// This is the only dynamic dispatch point of the storage layer.
pub trait ErasedStorage: Any {
    /// Removes the entity's component if it has one. Returns whether
    /// something was removed.
    fn remove_if_present(&mut self, entity: EntityId) -> bool;

    /// Copies the component of `source` to `target`. Returns `false` if the
    /// source has none or the target already has one.
    fn duplicate(&mut self, source: EntityId, target: EntityId) -> bool;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Name of the stored component type.
    fn component_name(&self) -> &'static str;

    /// Upcast for downcasting to the concrete storage.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete storage.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ErasedStorage for ComponentStorage<C> {
    fn remove_if_present(&mut self, entity: EntityId) -> bool {
        self.take(entity).is_some()
    }

    fn duplicate(&mut self, source: EntityId, target: EntityId) -> bool {
        let Some(value) = self.try_get(source).cloned() else {
            return false;
        };
        self.insert(target, value).is_ok()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn component_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns every component storage and the type registry.
///
/// Types are keyed by [`TypeId`]; each gets the next free [`ComponentType`]
/// at registration.
pub struct ComponentManager {
    /// Concrete type -> runtime id.
    types: HashMap<TypeId, ComponentType>,
    /// Storages, indexed by runtime id.
    storages: Vec<Box<dyn ErasedStorage>>,
    /// Entity capacity handed to new storages.
    capacity: usize,
}

impl ComponentManager {
    /// Creates an empty manager for worlds of `capacity` entities.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            types: HashMap::new(),
            storages: Vec::with_capacity(MAX_COMPONENT_TYPES),
            capacity,
        }
    }

    /// Registers `C` and returns its runtime id.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ComponentAlreadyRegistered`] on a second call for `C`
    /// - [`EcsError::TooManyComponentTypes`] when all 64 bits are taken
    pub fn register_component<C: Component>(&mut self) -> EcsResult<ComponentType> {
        if self.types.contains_key(&TypeId::of::<C>()) {
            return Err(EcsError::ComponentAlreadyRegistered(type_name::<C>()));
        }
        let ty = ComponentType::new(self.storages.len()).ok_or(
            EcsError::TooManyComponentTypes {
                limit: MAX_COMPONENT_TYPES,
            },
        )?;

        self.types.insert(TypeId::of::<C>(), ty);
        self.storages
            .push(Box::new(ComponentStorage::<C>::new(self.capacity)));
        tracing::debug!(component = type_name::<C>(), id = ty.index(), "registered component");

        Ok(ty)
    }

    /// Runtime id of `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` is unknown.
    pub fn component_type<C: Component>(&self) -> EcsResult<ComponentType> {
        self.types
            .get(&TypeId::of::<C>())
            .copied()
            .ok_or(EcsError::ComponentNotRegistered(type_name::<C>()))
    }

    /// Number of registered component types.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.storages.len()
    }

    /// Typed storage of `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` is unknown.
    pub fn storage<C: Component>(&self) -> EcsResult<&ComponentStorage<C>> {
        let ty = self.component_type::<C>()?;
        self.storages[ty.index()]
            .as_any()
            .downcast_ref::<ComponentStorage<C>>()
            .ok_or(EcsError::ComponentNotRegistered(type_name::<C>()))
    }

    /// Typed storage of `C`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` is unknown.
    pub fn storage_mut<C: Component>(&mut self) -> EcsResult<&mut ComponentStorage<C>> {
        let ty = self.component_type::<C>()?;
        self.storages[ty.index()]
            .as_any_mut()
            .downcast_mut::<ComponentStorage<C>>()
            .ok_or(EcsError::ComponentNotRegistered(type_name::<C>()))
    }

    /// Adds a component. Does not touch signatures; use `World::add_component`.
    ///
    /// # Errors
    ///
    /// Unregistered type or duplicate component.
    pub fn add_component<C: Component>(&mut self, entity: EntityId, value: C) -> EcsResult<()> {
        self.storage_mut::<C>()?.insert(entity, value)
    }

    /// Removes a component. Does not touch signatures; use
    /// `World::remove_component`.
    ///
    /// # Errors
    ///
    /// Unregistered type or absent component.
    pub fn remove_component<C: Component>(&mut self, entity: EntityId) -> EcsResult<C> {
        self.storage_mut::<C>()?.remove(entity)
    }

    /// Gets a component.
    ///
    /// # Errors
    ///
    /// Unregistered type or absent component.
    pub fn get_component<C: Component>(&self, entity: EntityId) -> EcsResult<&C> {
        self.storage::<C>()?.get(entity)
    }

    /// Gets a component mutably.
    ///
    /// # Errors
    ///
    /// Unregistered type or absent component.
    pub fn get_component_mut<C: Component>(&mut self, entity: EntityId) -> EcsResult<&mut C> {
        self.storage_mut::<C>()?.get_mut(entity)
    }

    /// Gets a component if both the type and the entry exist.
    #[must_use]
    pub fn try_get_component<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.storage::<C>().ok()?.try_get(entity)
    }

    /// Gets a component mutably if both the type and the entry exist.
    pub fn try_get_component_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        self.storage_mut::<C>().ok()?.try_get_mut(entity)
    }

    /// Purges every component `entity` held. Absent entries are skipped.
    pub fn entity_destroyed(&mut self, entity: EntityId) {
        for storage in &mut self.storages {
            storage.remove_if_present(entity);
        }
    }

    /// Copies every component of `source` to `target`.
    pub fn duplicate_all(&mut self, source: EntityId, target: EntityId) {
        for storage in &mut self.storages {
            storage.duplicate(source, target);
        }
    }

    /// `(name, len)` of every storage, in registration order.
    pub fn summary(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.storages
            .iter()
            .map(|s| (s.component_name(), s.len()))
    }
}
