//! # Entity Management
//!
//! Entities are 16-bit identifiers drawn from a bounded pool. The registry
//! owns, per live entity, its component [`Signature`] and its [`Layer`].
//!
//! Ids are recycled: a destroyed id goes to the back of a FIFO queue and is
//! handed out again before any never-used id.

use std::collections::VecDeque;
use std::fmt;

use lodestar_shared::constants::ENTITY_ID_LIMIT;

use super::component::Signature;
use crate::error::{EcsError, EcsResult};

/// Unique identifier for a live entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u16);

impl EntityId {
    /// Creates an entity id from its raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the index into per-entity tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grouping tag stored next to the signature.
///
/// The registry never interprets it; downstream code uses it to order
/// rendering and updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Layer(pub u16);

/// Per-slot bookkeeping for one entity id.
#[derive(Clone, Copy, Debug, Default)]
struct EntityRecord {
    /// Components currently attached.
    signature: Signature,
    /// Grouping tag.
    layer: Layer,
    /// Whether this slot is currently live.
    alive: bool,
}

/// Owns the set of live entity ids.
///
/// All slots are allocated up front; creating and destroying entities never
/// allocates.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = EntityRegistry::new(5000);
/// let player = registry.create_entity(Layer(1))?;
/// registry.destroy_entity(player);
/// ```
pub struct EntityRegistry {
    /// One record per possible id.
    records: Box<[EntityRecord]>,
    /// Destroyed ids waiting to be reused, oldest first.
    recycled: VecDeque<EntityId>,
    /// Lowest id never handed out.
    next_fresh: usize,
    /// Number of live entities.
    alive_count: usize,
}

impl EntityRegistry {
    /// Creates a registry able to hold `capacity` live entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds the 16-bit id space.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            capacity <= ENTITY_ID_LIMIT,
            "Capacity cannot exceed {ENTITY_ID_LIMIT}"
        );

        Self {
            records: vec![EntityRecord::default(); capacity].into_boxed_slice(),
            recycled: VecDeque::with_capacity(capacity),
            next_fresh: 0,
            alive_count: 0,
        }
    }

    /// Maximum number of concurrently live entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.alive_count
    }

    /// Creates an entity on `layer` with an empty signature.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityPoolExhausted`] when every id is live.
    pub fn create_entity(&mut self, layer: Layer) -> EcsResult<EntityId> {
        let id = if let Some(id) = self.recycled.pop_front() {
            id
        } else if self.next_fresh < self.capacity() {
            // capacity <= ENTITY_ID_LIMIT, so the index fits
            let id = EntityId::new(self.next_fresh as u16);
            self.next_fresh += 1;
            id
        } else {
            tracing::error!(capacity = self.capacity(), "entity pool exhausted");
            return Err(EcsError::EntityPoolExhausted {
                capacity: self.capacity(),
            });
        };

        self.records[id.index()] = EntityRecord {
            signature: Signature::EMPTY,
            layer,
            alive: true,
        };
        self.alive_count += 1;

        Ok(id)
    }

    /// Destroys an entity, returning its id to the pool.
    ///
    /// Returns `false` without doing anything if the id is not live.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(record) = self.records.get_mut(id.index()) else {
            return false;
        };
        if !record.alive {
            tracing::trace!(entity = %id, "destroy of a non-live entity ignored");
            return false;
        }

        *record = EntityRecord::default();
        self.alive_count -= 1;
        self.recycled.push_back(id);

        true
    }

    /// Checks if an entity is live.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.records.get(id.index()).is_some_and(|r| r.alive)
    }

    fn record(&self, id: EntityId) -> EcsResult<&EntityRecord> {
        self.records
            .get(id.index())
            .filter(|r| r.alive)
            .ok_or(EcsError::EntityNotFound(id))
    }

    fn record_mut(&mut self, id: EntityId) -> EcsResult<&mut EntityRecord> {
        self.records
            .get_mut(id.index())
            .filter(|r| r.alive)
            .ok_or(EcsError::EntityNotFound(id))
    }

    /// Replaces the signature of a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn set_signature(&mut self, id: EntityId, signature: Signature) -> EcsResult<()> {
        self.record_mut(id)?.signature = signature;
        Ok(())
    }

    /// Signature of a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn signature(&self, id: EntityId) -> EcsResult<Signature> {
        self.record(id).map(|r| r.signature)
    }

    /// Number of components attached to a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn component_count(&self, id: EntityId) -> EcsResult<u32> {
        self.signature(id).map(Signature::count)
    }

    /// Layer of a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn layer(&self, id: EntityId) -> EcsResult<Layer> {
        self.record(id).map(|r| r.layer)
    }

    /// Moves a live entity to another layer.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotFound`] if the entity is not live.
    pub fn set_layer(&mut self, id: EntityId, layer: Layer) -> EcsResult<()> {
        self.record_mut(id)?.layer = layer;
        Ok(())
    }

    /// Iterates over all live entity ids, in id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records[..self.next_fresh]
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive)
            .map(|(i, _)| EntityId::new(i as u16))
    }
}
