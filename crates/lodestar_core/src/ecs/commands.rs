//! # Deferred Commands
//!
//! Systems must not change the entity set while a working set is being
//! iterated. Instead they queue the change here; the [`World`] drains the
//! queue right after the running system's `update()` returns.
//!
//! [`World`]: super::World

use std::collections::BTreeSet;

use super::entity::EntityId;

/// Structural changes requested during a system update.
#[derive(Debug, Default)]
pub struct Commands {
    /// Entities to destroy, in request order, without duplicates.
    pending_destroy: Vec<EntityId>,
    /// Same entities, for membership checks.
    marked: BTreeSet<EntityId>,
}

impl Commands {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `entity` for destruction once the current system finishes.
    ///
    /// Marking the same entity twice queues it once.
    pub fn destroy(&mut self, entity: EntityId) {
        if self.marked.insert(entity) {
            self.pending_destroy.push(entity);
        }
    }

    /// Checks if `entity` is already marked for destruction.
    #[must_use]
    pub fn is_pending_destroy(&self, entity: EntityId) -> bool {
        self.marked.contains(&entity)
    }

    /// Entities marked for destruction, in request order.
    #[must_use]
    pub fn pending_destroy(&self) -> &[EntityId] {
        &self.pending_destroy
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_destroy.is_empty()
    }

    /// Takes the queued destructions, leaving the queue empty.
    pub(crate) fn take_destroyed(&mut self) -> Vec<EntityId> {
        self.marked.clear();
        std::mem::take(&mut self.pending_destroy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destroy_is_deduplicated() {
        let mut commands = Commands::new();
        commands.destroy(EntityId::new(4));
        commands.destroy(EntityId::new(2));
        commands.destroy(EntityId::new(4));

        assert_eq!(commands.pending_destroy(), &[EntityId::new(4), EntityId::new(2)]);
        assert!(commands.is_pending_destroy(EntityId::new(2)));

        let drained = commands.take_destroyed();
        assert_eq!(drained.len(), 2);
        assert!(commands.is_empty());
        assert!(!commands.is_pending_destroy(EntityId::new(4)));
    }

    #[test]
    fn test_entity_can_be_marked_again_after_drain() {
        let mut commands = Commands::new();
        commands.destroy(EntityId::new(7));
        let _ = commands.take_destroyed();

        commands.destroy(EntityId::new(7));
        assert_eq!(commands.pending_destroy(), &[EntityId::new(7)]);
        assert!(commands.is_pending_destroy(EntityId::new(7)));
    }
}
