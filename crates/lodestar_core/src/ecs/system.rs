//! # System Registry
//!
//! Systems are registered once at startup, in the order they must run.
//! Each declares a required [`Signature`] and a [`Linkage`]; whenever an
//! entity's signature changes the registry re-decides, per system, whether
//! the entity belongs to that system's working set.
//!
//! ```text
//! Linked:    member iff (system & entity) == system   (needs every component)
//! Unlinked:  member iff (system & entity) != 0        (needs any component)
//! ```
//!
//! There is no dependency graph: registration order is iteration order.

use std::any::{type_name, Any, TypeId};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use super::commands::Commands;
use super::component::{Component, ComponentType, Signature};
use super::diagnostics::{DiagnosticsSink, RuntimeReport, TracingDiagnostics};
use super::entity::{EntityId, EntityRegistry};
use super::storage::{ComponentManager, ComponentStorage};
use crate::error::{EcsError, EcsResult};

/// Ordered set of entity ids a system processes.
pub type EntitySet = BTreeSet<EntityId>;

/// How a system's signature is matched against entity signatures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Linkage {
    /// The entity must carry every required component.
    #[default]
    Linked,
    /// Any one required component is enough.
    Unlinked,
}

impl Linkage {
    /// Decides membership of an entity with signature `entity` in a system
    /// requiring `required`.
    #[inline]
    #[must_use]
    pub const fn matches(self, required: Signature, entity: Signature) -> bool {
        match self {
            Self::Linked => required.is_subset_of(entity),
            Self::Unlinked => required.intersects(entity),
        }
    }
}

/// Upcast helper so registered systems can be handed back as their
/// concrete type.
pub trait AsAny: Any {
    /// `&self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// `&mut self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of per-frame game logic.
///
/// # Example
///
/// ```rust,ignore
/// struct Gravity;
///
/// impl System for Gravity {
///     fn update(&mut self, ctx: &mut SystemContext<'_>, entities: &EntitySet) -> EcsResult<()> {
///         for &entity in entities {
///             ctx.get_mut::<Dynamics>(entity)?.force.y = -9.81;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait System: AsAny {
    /// Called once, at registration.
    ///
    /// # Errors
    ///
    /// Any error aborts the registration.
    fn init(&mut self, _components: &ComponentManager) -> EcsResult<()> {
        Ok(())
    }

    /// Matching policy used from registration on.
    fn linkage(&self) -> Linkage {
        Linkage::Linked
    }

    /// Runs one frame of the system over its working set.
    ///
    /// # Errors
    ///
    /// Errors propagate out of `World::update_systems`.
    fn update(&mut self, ctx: &mut SystemContext<'_>, entities: &EntitySet) -> EcsResult<()>;
}

/// What a system may touch while it runs.
///
/// Component values are readable and writable; structural changes go
/// through [`Commands`] and are applied after the update returns.
pub struct SystemContext<'a> {
    components: &'a mut ComponentManager,
    entities: &'a EntityRegistry,
    commands: &'a mut Commands,
    delta_time: f32,
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(
        components: &'a mut ComponentManager,
        entities: &'a EntityRegistry,
        commands: &'a mut Commands,
        delta_time: f32,
    ) -> Self {
        Self {
            components,
            entities,
            commands,
            delta_time,
        }
    }

    /// Seconds elapsed since the previous frame.
    #[inline]
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// The entity registry (read-only).
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        self.entities
    }

    /// Deferred structural changes.
    pub fn commands(&mut self) -> &mut Commands {
        self.commands
    }

    /// Gets a component.
    ///
    /// # Errors
    ///
    /// Unregistered type or absent component.
    pub fn get<C: Component>(&self, entity: EntityId) -> EcsResult<&C> {
        self.components.get_component(entity)
    }

    /// Gets a component mutably.
    ///
    /// # Errors
    ///
    /// Unregistered type or absent component.
    pub fn get_mut<C: Component>(&mut self, entity: EntityId) -> EcsResult<&mut C> {
        self.components.get_component_mut(entity)
    }

    /// Gets a component if present.
    #[must_use]
    pub fn try_get<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.components.try_get_component(entity)
    }

    /// Gets a component mutably if present.
    pub fn try_get_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        self.components.try_get_component_mut(entity)
    }

    /// Typed storage of `C`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentNotRegistered`] if `C` is unknown.
    pub fn storage<C: Component>(&self) -> EcsResult<&ComponentStorage<C>> {
        self.components.storage()
    }
}

/// Registry bookkeeping for one system.
struct SystemSlot {
    type_id: TypeId,
    name: &'static str,
    system: Box<dyn System>,
    signature: Signature,
    linkage: Linkage,
    active: bool,
    entities: EntitySet,
    /// Duration of the most recent update (zero when skipped).
    last_frame: Duration,
    /// Sum of update durations since the last report.
    accumulated: Duration,
}

/// Owns the ordered list of systems.
pub struct SystemManager {
    slots: Vec<SystemSlot>,
    diagnostics: Box<dyn DiagnosticsSink>,
    report_interval: Duration,
    last_report: Instant,
}

impl SystemManager {
    /// Creates an empty registry reporting every `report_interval` to the
    /// `tracing` sink.
    #[must_use]
    pub fn new(report_interval: Duration) -> Self {
        Self {
            slots: Vec::new(),
            diagnostics: Box::new(TracingDiagnostics),
            report_interval,
            last_report: Instant::now(),
        }
    }

    /// Replaces the diagnostics sink.
    pub fn set_diagnostics(&mut self, sink: Box<dyn DiagnosticsSink>) {
        self.diagnostics = sink;
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn position<S: System>(&self) -> EcsResult<usize> {
        let id = TypeId::of::<S>();
        self.slots
            .iter()
            .position(|slot| slot.type_id == id)
            .ok_or(EcsError::SystemNotRegistered(type_name::<S>()))
    }

    fn slot_mut<S: System>(&mut self) -> EcsResult<&mut SystemSlot> {
        let index = self.position::<S>()?;
        Ok(&mut self.slots[index])
    }

    /// Adopts `system`, calls its `init()`, and inserts it at `index`
    /// (clamped to the end) or appends it.
    ///
    /// The new system starts active with an empty signature and an empty
    /// working set; existing entities are not evaluated.
    ///
    /// # Errors
    ///
    /// - [`EcsError::SystemAlreadyRegistered`] if `S` is already present
    /// - any error returned by `init()`
    pub fn register_system<S: System>(
        &mut self,
        mut system: S,
        index: Option<usize>,
        components: &ComponentManager,
    ) -> EcsResult<()> {
        if self.position::<S>().is_ok() {
            return Err(EcsError::SystemAlreadyRegistered(type_name::<S>()));
        }

        system.init(components)?;

        let slot = SystemSlot {
            type_id: TypeId::of::<S>(),
            name: type_name::<S>(),
            linkage: system.linkage(),
            system: Box::new(system),
            signature: Signature::EMPTY,
            active: true,
            entities: EntitySet::new(),
            last_frame: Duration::ZERO,
            accumulated: Duration::ZERO,
        };

        let at = index.map_or(self.slots.len(), |i| i.min(self.slots.len()));
        tracing::debug!(system = slot.name, position = at, "registered system");
        self.slots.insert(at, slot);

        Ok(())
    }

    /// Adds `component` to the signature required by `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn add_component_type<S: System>(&mut self, component: ComponentType) -> EcsResult<()> {
        self.slot_mut::<S>()?.signature.insert(component);
        Ok(())
    }

    /// Enables or disables updates of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn set_system_state<S: System>(&mut self, active: bool) -> EcsResult<()> {
        self.slot_mut::<S>()?.active = active;
        Ok(())
    }

    /// Whether `S` is updated each frame.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn is_active<S: System>(&self) -> EcsResult<bool> {
        self.position::<S>().map(|i| self.slots[i].active)
    }

    /// Changes the matching policy of `S`. Existing members are kept until
    /// their signature next changes.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn set_linkage<S: System>(&mut self, linkage: Linkage) -> EcsResult<()> {
        self.slot_mut::<S>()?.linkage = linkage;
        Ok(())
    }

    /// Signature required by `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn signature<S: System>(&self) -> EcsResult<Signature> {
        self.position::<S>().map(|i| self.slots[i].signature)
    }

    /// The registered instance of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn system<S: System>(&self) -> EcsResult<&S> {
        let index = self.position::<S>()?;
        // Deref the box first: `Box<dyn System>` is itself `Any`.
        (*self.slots[index].system)
            .as_any()
            .downcast_ref::<S>()
            .ok_or(EcsError::SystemNotRegistered(type_name::<S>()))
    }

    /// The registered instance of `S`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn system_mut<S: System>(&mut self) -> EcsResult<&mut S> {
        let index = self.position::<S>()?;
        (*self.slots[index].system)
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or(EcsError::SystemNotRegistered(type_name::<S>()))
    }

    /// Current working set of `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::SystemNotRegistered`] if `S` is unknown.
    pub fn entities_of<S: System>(&self) -> EcsResult<&EntitySet> {
        self.position::<S>().map(|i| &self.slots[i].entities)
    }

    /// Re-decides membership of `entity`, whose signature is now
    /// `signature`, in every system.
    pub fn update_entities_list(&mut self, entity: EntityId, signature: Signature) {
        for slot in &mut self.slots {
            if slot.linkage.matches(slot.signature, signature) {
                slot.entities.insert(entity);
            } else {
                slot.entities.remove(&entity);
            }
        }
    }

    /// Removes `entity` from every working set.
    pub fn entity_destroyed(&mut self, entity: EntityId) {
        for slot in &mut self.slots {
            slot.entities.remove(&entity);
        }
    }

    /// Adds `new` to every working set that contains `source`.
    ///
    /// Membership is copied, not re-evaluated: the caller is responsible for
    /// having given `new` the same signature and components.
    pub fn clone_entity(&mut self, new: EntityId, source: EntityId) {
        for slot in &mut self.slots {
            if slot.entities.contains(&source) {
                slot.entities.insert(new);
            }
        }
    }

    /// Runs the system at `index` if it is active, timing the call.
    ///
    /// Inactive systems are not called and record a zero duration.
    ///
    /// # Errors
    ///
    /// Whatever the system's `update()` returns.
    pub fn run_system(&mut self, index: usize, ctx: &mut SystemContext<'_>) -> EcsResult<()> {
        let Some(slot) = self.slots.get_mut(index) else {
            return Ok(());
        };
        if !slot.active {
            slot.last_frame = Duration::ZERO;
            return Ok(());
        }

        let start = Instant::now();
        let result = slot.system.update(ctx, &slot.entities);
        let elapsed = start.elapsed();

        slot.last_frame = elapsed;
        slot.accumulated += elapsed;
        result
    }

    /// Closes a frame: sends a report to the diagnostics sink if the
    /// interval has elapsed since the previous one.
    ///
    /// Returns whether a report was sent.
    pub fn end_frame(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_report) < self.report_interval {
            return false;
        }

        let report = self.runtime_report();
        self.diagnostics.report(&report);

        for slot in &mut self.slots {
            slot.accumulated = Duration::ZERO;
        }
        self.last_report = now;
        true
    }

    /// Per-system share of the time accumulated since the last report.
    #[must_use]
    pub fn runtime_report(&self) -> RuntimeReport {
        RuntimeReport::from_times(self.slots.iter().map(|s| (s.name, s.accumulated)))
    }

    /// Names of the registered systems, in update order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.name).collect()
    }

    /// Duration of each system's most recent update, in update order.
    #[must_use]
    pub fn system_times(&self) -> Vec<Duration> {
        self.slots.iter().map(|s| s.last_frame).collect()
    }
}

impl Default for SystemManager {
    fn default() -> Self {
        Self::new(Duration::from_millis(lodestar_shared::DIAGNOSTICS_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Movement;
    impl System for Movement {
        fn update(&mut self, _: &mut SystemContext<'_>, _: &EntitySet) -> EcsResult<()> {
            Ok(())
        }
    }

    struct Input;
    impl System for Input {
        fn linkage(&self) -> Linkage {
            Linkage::Unlinked
        }

        fn update(&mut self, _: &mut SystemContext<'_>, _: &EntitySet) -> EcsResult<()> {
            Ok(())
        }
    }

    struct Audio {
        initialised: bool,
    }
    impl System for Audio {
        fn init(&mut self, _: &ComponentManager) -> EcsResult<()> {
            self.initialised = true;
            Ok(())
        }

        fn update(&mut self, _: &mut SystemContext<'_>, _: &EntitySet) -> EcsResult<()> {
            Ok(())
        }
    }

    fn ty(id: usize) -> ComponentType {
        ComponentType::new(id).unwrap()
    }

    fn manager() -> (SystemManager, ComponentManager) {
        (SystemManager::default(), ComponentManager::new(16))
    }

    #[test]
    fn test_linkage_rules() {
        let required = Signature::of(&[ty(0), ty(1)]);
        let only_first = Signature::of(&[ty(0)]);
        let both = Signature::of(&[ty(0), ty(1), ty(5)]);

        assert!(!Linkage::Linked.matches(required, only_first));
        assert!(Linkage::Linked.matches(required, both));
        assert!(Linkage::Unlinked.matches(required, only_first));
        assert!(!Linkage::Unlinked.matches(required, Signature::of(&[ty(5)])));
    }

    #[test]
    fn test_register_twice_fails() {
        let (mut systems, components) = manager();
        systems.register_system(Movement, None, &components).unwrap();

        assert_eq!(
            systems.register_system(Movement, None, &components),
            Err(EcsError::SystemAlreadyRegistered(type_name::<Movement>()))
        );
        assert_eq!(systems.len(), 1);
    }

    #[test]
    fn test_register_calls_init() {
        let (mut systems, components) = manager();
        systems
            .register_system(Audio { initialised: false }, None, &components)
            .unwrap();
        assert!(systems.system::<Audio>().unwrap().initialised);
    }

    #[test]
    fn test_register_at_index() {
        let (mut systems, components) = manager();
        systems.register_system(Movement, None, &components).unwrap();
        systems.register_system(Input, Some(0), &components).unwrap();
        systems
            .register_system(Audio { initialised: false }, Some(99), &components)
            .unwrap();

        assert_eq!(
            systems.system_names(),
            vec![
                type_name::<Input>(),
                type_name::<Movement>(),
                type_name::<Audio>()
            ]
        );
    }

    #[test]
    fn test_membership_follows_signature() {
        let (mut systems, components) = manager();
        systems.register_system(Movement, None, &components).unwrap();
        systems.register_system(Input, None, &components).unwrap();
        for system_ty in [ty(0), ty(1)] {
            systems.add_component_type::<Movement>(system_ty).unwrap();
            systems.add_component_type::<Input>(system_ty).unwrap();
        }

        let e = EntityId::new(3);
        systems.update_entities_list(e, Signature::of(&[ty(0)]));
        assert!(!systems.entities_of::<Movement>().unwrap().contains(&e));
        assert!(systems.entities_of::<Input>().unwrap().contains(&e));

        systems.update_entities_list(e, Signature::of(&[ty(0), ty(1)]));
        assert!(systems.entities_of::<Movement>().unwrap().contains(&e));

        systems.update_entities_list(e, Signature::EMPTY);
        assert!(!systems.entities_of::<Movement>().unwrap().contains(&e));
        assert!(!systems.entities_of::<Input>().unwrap().contains(&e));
    }

    #[test]
    fn test_clone_copies_membership() {
        let (mut systems, components) = manager();
        systems.register_system(Movement, None, &components).unwrap();
        systems.register_system(Input, None, &components).unwrap();
        systems.add_component_type::<Movement>(ty(0)).unwrap();
        systems.add_component_type::<Input>(ty(1)).unwrap();

        let source = EntityId::new(1);
        systems.update_entities_list(source, Signature::of(&[ty(0)]));
        systems.clone_entity(EntityId::new(2), source);

        assert!(systems.entities_of::<Movement>().unwrap().contains(&EntityId::new(2)));
        assert!(!systems.entities_of::<Input>().unwrap().contains(&EntityId::new(2)));

        systems.entity_destroyed(EntityId::new(2));
        assert!(!systems.entities_of::<Movement>().unwrap().contains(&EntityId::new(2)));
    }

    #[test]
    fn test_unknown_system() {
        let (mut systems, _) = manager();
        assert_eq!(
            systems.set_system_state::<Movement>(false),
            Err(EcsError::SystemNotRegistered(type_name::<Movement>()))
        );
        assert!(systems.system::<Movement>().is_err());
    }

    #[test]
    fn test_end_frame_respects_interval() {
        let mut systems = SystemManager::new(Duration::from_secs(3600));
        let start = Instant::now();
        assert!(!systems.end_frame(start));

        let mut eager = SystemManager::new(Duration::ZERO);
        eager.set_diagnostics(Box::new(super::super::diagnostics::NullDiagnostics));
        assert!(eager.end_frame(Instant::now()));
    }
}
